//! Generation configuration
//!
//! `GenerationConfig` is immutable for the lifetime of one request. The model
//! id carries the backend prefix used for adapter selection.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::tools::ToolDefinition;
use crate::error::LlmError;

const MODEL_ID_SEPARATOR: &str = "::";

/// A parsed `"<backend>::<model-name>"` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelId {
    backend: String,
    model: String,
}

impl ModelId {
    /// Split on the first `::`. Both halves must be non-empty.
    pub fn parse(raw: &str) -> Result<Self, LlmError> {
        let (backend, model) = raw.split_once(MODEL_ID_SEPARATOR).ok_or_else(|| {
            LlmError::ConfigurationError(format!(
                "Invalid model id `{raw}`: expected `<backend>::<model-name>`"
            ))
        })?;
        let backend = backend.trim();
        let model = model.trim();
        if backend.is_empty() || model.is_empty() {
            return Err(LlmError::ConfigurationError(format!(
                "Invalid model id `{raw}`: backend and model name must both be non-empty"
            )));
        }
        Ok(Self {
            backend: backend.to_string(),
            model: model.to_string(),
        })
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.backend, MODEL_ID_SEPARATOR, self.model)
    }
}

impl Serialize for ModelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ModelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Reasoning effort hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
    #[serde(rename = "xhigh")]
    XHigh,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::XHigh => "xhigh",
        }
    }
}

/// Per-request generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: ModelId,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Request visible reasoning
    #[serde(default)]
    pub show_thoughts: bool,
    #[serde(default)]
    pub extra_headers: HashMap<String, String>,
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
    /// Overrides the backend's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

impl GenerationConfig {
    pub fn new(model: &str) -> Result<Self, LlmError> {
        Ok(Self {
            model: ModelId::parse(model)?,
            system_prompt: None,
            reasoning_effort: None,
            show_thoughts: false,
            extra_headers: HashMap::new(),
            tools: Vec::new(),
            base_url: None,
        })
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn with_show_thoughts(mut self, show: bool) -> Self {
        self.show_thoughts = show;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_id_splits_on_first_separator() {
        let id = ModelId::parse("ollama::library/qwen3::8b").unwrap();
        assert_eq!(id.backend(), "ollama");
        assert_eq!(id.model(), "library/qwen3::8b");
        assert_eq!(id.to_string(), "ollama::library/qwen3::8b");
    }

    #[test]
    fn model_id_rejects_missing_halves() {
        assert!(ModelId::parse("gpt-4o").is_err());
        assert!(ModelId::parse("::gpt-4o").is_err());
        assert!(ModelId::parse("openai::").is_err());
    }

    #[test]
    fn reasoning_effort_uses_lowercase_names() {
        let effort: ReasoningEffort = serde_json::from_str("\"xhigh\"").unwrap();
        assert_eq!(effort, ReasoningEffort::XHigh);
        assert_eq!(serde_json::to_string(&ReasoningEffort::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"model": "anthropic::claude-sonnet-4"}"#).unwrap();
        assert_eq!(config.model.backend(), "anthropic");
        assert!(!config.show_thoughts);
        assert!(config.tools.is_empty());
    }
}
