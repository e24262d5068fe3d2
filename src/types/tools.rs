//! Tool calling and function definition types

use serde::{Deserialize, Serialize};

/// Separator between toolset and tool name in a namespaced tool name.
pub const TOOLSET_SEPARATOR: &str = "__";

/// Tool definition offered to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Toolset the tool belongs to (e.g. "files")
    pub toolset: String,
    /// Bare tool name (e.g. "read")
    pub name: String,
    /// Human description shown to the model
    pub description: String,
    /// JSON schema for the tool input
    pub input_schema: serde_json::Value,
}

impl ToolDefinition {
    pub fn new(
        toolset: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            toolset: toolset.into(),
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Name sent to vendors and expected back in tool calls.
    pub fn namespaced_name(&self) -> String {
        format!("{}{}{}", self.toolset, TOOLSET_SEPARATOR, self.name)
    }
}

/// Split a namespaced name into `(toolset, tool)`.
///
/// Without a separator the bare name is used for both halves.
pub fn split_namespaced_name(namespaced: &str) -> (String, String) {
    match namespaced.split_once(TOOLSET_SEPARATOR) {
        Some((toolset, tool)) if !toolset.is_empty() && !tool.is_empty() => {
            (toolset.to_string(), tool.to_string())
        }
        _ => (namespaced.to_string(), namespaced.to_string()),
    }
}

/// A tool call finalized at the end of a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub id: String,
    pub namespaced_name: String,
    pub toolset: String,
    pub tool_name: String,
    /// Parsed arguments; `None` when `parse_error` is set
    pub arguments: Option<serde_json::Value>,
    /// Parse failure of the accumulated argument string, if any
    pub parse_error: Option<String>,
    /// Raw accumulated argument string as received
    pub raw_arguments: String,
    pub description: Option<String>,
    pub input_schema: Option<serde_json::Value>,
}

/// Finished tool call replayed as part of an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub namespaced_name: String,
    pub arguments: serde_json::Value,
}

/// Output of a tool call, carried by a `tool_results` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultRecord {
    pub tool_call_id: String,
    pub namespaced_name: String,
    pub content: String,
}
