//! Conversation formatting helpers
//!
//! Decides what each message contributes to a vendor request: text
//! attachments are spliced inline, media becomes native parts where the
//! backend supports it, and everything else becomes a short note. Reading
//! attachment bytes is delegated to an `AttachmentResolver`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{
    Attachment, AttachmentKind, Message, ReasoningEffort, Role, ToolCallRecord, ToolResultRecord,
};

/// An attachment after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAttachment {
    Text(String),
    Binary { mime_type: String, base64: String },
}

/// Turns an opaque attachment reference into text or bytes.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(&self, attachment: &Attachment) -> Result<ResolvedAttachment, LlmError>;
}

/// Resolver backed by a reference -> content map.
#[derive(Debug, Default, Clone)]
pub struct MemoryAttachmentResolver {
    entries: HashMap<String, ResolvedAttachment>,
}

impl MemoryAttachmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, reference: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries
            .insert(reference.into(), ResolvedAttachment::Text(text.into()));
        self
    }

    pub fn with_binary(
        mut self,
        reference: impl Into<String>,
        mime_type: impl Into<String>,
        base64: impl Into<String>,
    ) -> Self {
        self.entries.insert(
            reference.into(),
            ResolvedAttachment::Binary {
                mime_type: mime_type.into(),
                base64: base64.into(),
            },
        );
        self
    }
}

#[async_trait]
impl AttachmentResolver for MemoryAttachmentResolver {
    async fn resolve(&self, attachment: &Attachment) -> Result<ResolvedAttachment, LlmError> {
        self.entries
            .get(&attachment.reference)
            .cloned()
            .ok_or_else(|| {
                LlmError::ConfigurationError(format!(
                    "attachment reference `{}` not found",
                    attachment.reference
                ))
            })
    }
}

/// Which media kinds a backend accepts natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaSupport {
    pub images: bool,
    pub pdfs: bool,
}

impl MediaSupport {
    pub const NONE: Self = Self {
        images: false,
        pdfs: false,
    };
    pub const IMAGES: Self = Self {
        images: true,
        pdfs: false,
    };
    pub const IMAGES_AND_PDFS: Self = Self {
        images: true,
        pdfs: true,
    };

    fn accepts(&self, kind: AttachmentKind) -> bool {
        match kind {
            AttachmentKind::Image => self.images,
            AttachmentKind::Pdf => self.pdfs,
            AttachmentKind::Text | AttachmentKind::Webpage => false,
        }
    }
}

/// Native media part carried next to the message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub kind: AttachmentKind,
    pub name: String,
    pub mime_type: String,
    pub base64: String,
}

/// A message ready for a vendor request builder.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedMessage {
    pub role: Role,
    /// Content with text attachments and notes appended
    pub text: String,
    pub media: Vec<MediaPart>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
}

/// Format every message of a conversation for `backend`.
pub async fn format_conversation(
    conversation: &[Message],
    resolver: &dyn AttachmentResolver,
    support: MediaSupport,
    backend: &str,
) -> Vec<FormattedMessage> {
    let mut formatted = Vec::with_capacity(conversation.len());
    for message in conversation {
        formatted.push(format_message(message, resolver, support, backend).await);
    }
    formatted
}

async fn format_message(
    message: &Message,
    resolver: &dyn AttachmentResolver,
    support: MediaSupport,
    backend: &str,
) -> FormattedMessage {
    let mut text = message.content.clone();
    let mut media = Vec::new();

    for attachment in &message.attachments {
        if !attachment.kind.is_textual() && !support.accepts(attachment.kind) {
            append_block(
                &mut text,
                &omitted_note(attachment, &format!("not supported by {backend}")),
            );
            continue;
        }

        match resolver.resolve(attachment).await {
            Ok(ResolvedAttachment::Text(body)) if attachment.kind.is_textual() => {
                append_block(&mut text, &attachment_block(attachment, &body));
            }
            Ok(ResolvedAttachment::Binary { mime_type, base64 }) if !attachment.kind.is_textual() => {
                media.push(MediaPart {
                    kind: attachment.kind,
                    name: attachment.name.clone(),
                    mime_type,
                    base64,
                });
            }
            Ok(_) => {
                append_block(
                    &mut text,
                    &omitted_note(attachment, "unexpected content type"),
                );
            }
            Err(error) => {
                tracing::warn!(
                    attachment = %attachment.name,
                    error = %error,
                    "Attachment could not be resolved"
                );
                append_block(&mut text, &omitted_note(attachment, "could not be loaded"));
            }
        }
    }

    FormattedMessage {
        role: message.role,
        text,
        media,
        tool_calls: message.tool_calls.clone(),
        tool_results: message.tool_results.clone(),
    }
}

/// Inline block for a text-like attachment.
pub fn attachment_block(attachment: &Attachment, body: &str) -> String {
    format!(
        "<attachment name=\"{}\" type=\"{}\">\n{}\n</attachment>",
        escape_attr(&attachment.name),
        attachment.kind.as_str(),
        body
    )
}

pub fn omitted_note(attachment: &Attachment, reason: &str) -> String {
    format!(
        "[Attachment \"{}\" ({}) omitted: {}]",
        attachment.name,
        attachment.kind.as_str(),
        reason
    )
}

fn append_block(text: &mut String, block: &str) {
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(block);
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Flatten a conversation into one prompt, for backends that take a single
/// text input. Media parts are mentioned by name only.
pub fn flatten_transcript(messages: &[FormattedMessage]) -> String {
    let mut sections = Vec::with_capacity(messages.len());
    for message in messages {
        let mut body = message.text.clone();
        for part in &message.media {
            append_block(
                &mut body,
                &format!("[Attachment \"{}\" ({})]", part.name, part.kind.as_str()),
            );
        }
        for call in &message.tool_calls {
            append_block(
                &mut body,
                &format!("[Called {} with {}]", call.namespaced_name, call.arguments),
            );
        }
        for result in &message.tool_results {
            append_block(
                &mut body,
                &format!(
                    "[Result of {} ({})]\n{}",
                    result.namespaced_name, result.tool_call_id, result.content
                ),
            );
        }
        let label = match message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::ToolResults => "Tool results",
        };
        sections.push(format!("{label}: {body}"));
    }
    sections.join("\n\n")
}

/// Token budget for reasoning backends that take one, by effort.
pub fn thinking_budget(effort: Option<ReasoningEffort>) -> u32 {
    match effort.unwrap_or_default() {
        ReasoningEffort::Low => 2048,
        ReasoningEffort::Medium => 8192,
        ReasoningEffort::High => 16384,
        ReasoningEffort::XHigh => 32000,
    }
}
