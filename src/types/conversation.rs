//! Conversation and message types

use serde::{Deserialize, Serialize};

use super::tools::{ToolCallRecord, ToolResultRecord};
use crate::error::LlmError;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResults,
}

/// Kind of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Text,
    Webpage,
    Image,
    Pdf,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Webpage => "webpage",
            Self::Image => "image",
            Self::Pdf => "pdf",
        }
    }

    /// Text-like kinds are spliced inline into the message text.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Webpage)
    }
}

/// An attachment on a user message.
///
/// `reference` is opaque; an `AttachmentResolver` turns it into inline text or bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub name: String,
    pub reference: String,
}

impl Attachment {
    pub fn new(kind: AttachmentKind, name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reference: reference.into(),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// User messages only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Assistant messages only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tool-results messages only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResultRecord>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachments: Vec::new(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(content)
        }
    }

    pub fn tool_results(results: Vec<ToolResultRecord>) -> Self {
        Self {
            role: Role::ToolResults,
            tool_results: results,
            ..Self::user("")
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_tool_call(mut self, call: ToolCallRecord) -> Self {
        self.tool_calls.push(call);
        self
    }

    /// Check the role-specific invariants.
    pub fn validate(&self) -> Result<(), LlmError> {
        if !self.attachments.is_empty() && self.role != Role::User {
            return Err(LlmError::ConfigurationError(
                "attachments are only allowed on user messages".to_string(),
            ));
        }
        if !self.tool_calls.is_empty() && self.role != Role::Assistant {
            return Err(LlmError::ConfigurationError(
                "tool calls are only allowed on assistant messages".to_string(),
            ));
        }
        if !self.tool_results.is_empty() && self.role != Role::ToolResults {
            return Err(LlmError::ConfigurationError(
                "tool results are only allowed on tool_results messages".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ordered message history for one request.
pub type Conversation = Vec<Message>;

/// Validate every message of a conversation.
pub fn validate_conversation(conversation: &[Message]) -> Result<(), LlmError> {
    conversation.iter().try_for_each(Message::validate)
}
