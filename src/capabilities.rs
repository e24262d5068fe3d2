//! Model-family capabilities
//!
//! Per-family reasoning rules live in a declarative table of
//! `model name pattern -> capabilities`. New families are new rows. The
//! first matching row wins.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCapabilities {
    /// Reasoning is too verbose to show and is replaced by a placeholder.
    pub redact_reasoning: bool,
    /// The backend accepts a request that turns reasoning off.
    pub can_disable_reasoning: bool,
}

impl Default for ModelCapabilities {
    fn default() -> Self {
        Self {
            redact_reasoning: false,
            can_disable_reasoning: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityRule {
    pattern: Regex,
    capabilities: ModelCapabilities,
}

impl CapabilityRule {
    /// `pattern` is matched case-insensitively against the model name.
    pub fn new(pattern: &str, capabilities: ModelCapabilities) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("(?i){pattern}"))?,
            capabilities,
        })
    }

    pub fn matches(&self, model: &str) -> bool {
        self.pattern.is_match(model)
    }
}

#[derive(Debug, Clone)]
pub struct CapabilityTable {
    rules: Vec<CapabilityRule>,
}

const fn caps(redact_reasoning: bool, can_disable_reasoning: bool) -> ModelCapabilities {
    ModelCapabilities {
        redact_reasoning,
        can_disable_reasoning,
    }
}

const BUILTIN_RULES: &[(&str, ModelCapabilities)] = &[
    // OpenAI reasoning models always reason.
    (r"^(o1|o3|o4)(-|$)", caps(false, false)),
    (r"gpt-oss", caps(true, false)),
    (r"gpt-5", caps(false, false)),
    (r"deepseek-r1", caps(false, false)),
    (r"claude-(3-7|sonnet-4|opus-4)", caps(false, true)),
    (r"gemini-2\.5-pro", caps(false, false)),
    (r"gemini-2\.5-flash", caps(false, true)),
    (r"qwen3", caps(false, true)),
    (r"grok-3-mini", caps(false, true)),
    (r"grok-4", caps(false, false)),
];

static BUILTIN: Lazy<CapabilityTable> = Lazy::new(|| CapabilityTable {
    rules: BUILTIN_RULES
        .iter()
        .filter_map(|(pattern, capabilities)| CapabilityRule::new(pattern, *capabilities).ok())
        .collect(),
});

impl Default for CapabilityTable {
    fn default() -> Self {
        BUILTIN.clone()
    }
}

impl CapabilityTable {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Insert a rule ahead of the built-in ones.
    pub fn with_rule(mut self, rule: CapabilityRule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    pub fn lookup(&self, model: &str) -> ModelCapabilities {
        self.rules
            .iter()
            .find(|rule| rule.matches(model))
            .map(|rule| rule.capabilities)
            .unwrap_or_default()
    }
}
