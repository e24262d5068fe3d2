//! Tracing subscriber setup
//!
//! The engine only emits `tracing` events. Embedders that have no subscriber
//! of their own can install one here.
//!
//! ```rust,ignore
//! use unistream::telemetry::{init_subscriber, OutputFormat, SubscriberConfig};
//!
//! let config = SubscriberConfig::builder()
//!     .log_level(tracing::Level::DEBUG)
//!     .output_format(OutputFormat::JsonCompact)
//!     .build();
//! init_subscriber(config)?;
//! ```

use crate::error::LlmError;

/// Output format for tracing logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    Json,
    JsonCompact,
}

impl std::str::FromStr for OutputFormat {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "json-compact" => Ok(Self::JsonCompact),
            other => Err(LlmError::ConfigurationError(format!(
                "Invalid log format: {other}. Valid options: text, json, json-compact"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub log_level: tracing::Level,
    pub output_format: OutputFormat,
    /// Extra `EnvFilter` directives appended after the crate's own
    pub directives: Vec<String>,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            log_level: tracing::Level::INFO,
            output_format: OutputFormat::Text,
            directives: Vec::new(),
        }
    }
}

impl SubscriberConfig {
    pub fn builder() -> SubscriberConfigBuilder {
        SubscriberConfigBuilder::default()
    }

    pub fn debug() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
            ..Self::default()
        }
    }

    /// The `EnvFilter` string this configuration installs.
    pub fn filter(&self) -> String {
        let level = self.log_level.as_str().to_lowercase();
        std::iter::once(format!("unistream={level}"))
            .chain(self.directives.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Default)]
pub struct SubscriberConfigBuilder {
    log_level: Option<tracing::Level>,
    output_format: Option<OutputFormat>,
    directives: Vec<String>,
}

impl SubscriberConfigBuilder {
    pub fn log_level(mut self, level: tracing::Level) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Set the log level from a string
    pub fn log_level_str(mut self, level: &str) -> Result<Self, LlmError> {
        let level = match level.trim().to_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            other => {
                return Err(LlmError::ConfigurationError(format!(
                    "Invalid log level: {other}. Valid options: trace, debug, info, warn, error"
                )));
            }
        };
        self.log_level = Some(level);
        Ok(self)
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn build(self) -> SubscriberConfig {
        SubscriberConfig {
            log_level: self.log_level.unwrap_or(tracing::Level::INFO),
            output_format: self.output_format.unwrap_or_default(),
            directives: self.directives,
        }
    }
}

/// Install a global fmt subscriber. An already installed subscriber is not
/// an error.
pub fn init_subscriber(config: SubscriberConfig) -> Result<(), LlmError> {
    let filter = config.filter();

    let init_result = match config.output_format {
        OutputFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .json()
            .try_init(),
        OutputFormat::JsonCompact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .try_init(),
        OutputFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    match init_result {
        Ok(()) => Ok(()),
        Err(e) if e.to_string().contains("already") => Ok(()),
        Err(e) => Err(LlmError::ConfigurationError(format!(
            "Failed to initialize tracing: {e}"
        ))),
    }
}

/// Configure from `UNISTREAM_LOG_LEVEL` and `UNISTREAM_LOG_FORMAT`.
pub fn init_from_env() -> Result<(), LlmError> {
    init_subscriber(config_from_lookup(|key| std::env::var(key).ok())?)
}

fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SubscriberConfig, LlmError> {
    let mut builder = SubscriberConfig::builder();
    if let Some(level) = lookup("UNISTREAM_LOG_LEVEL") {
        builder = builder.log_level_str(&level)?;
    }
    if let Some(format) = lookup("UNISTREAM_LOG_FORMAT") {
        builder = builder.output_format(format.parse()?);
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_scopes_to_the_crate() {
        let config = SubscriberConfig::builder()
            .log_level(tracing::Level::DEBUG)
            .directive("reqwest=warn")
            .build();
        assert_eq!(config.filter(), "unistream=debug,reqwest=warn");
    }

    #[test]
    fn env_values_are_validated() {
        let config = config_from_lookup(|key| match key {
            "UNISTREAM_LOG_LEVEL" => Some("TRACE".into()),
            "UNISTREAM_LOG_FORMAT" => Some("json-compact".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.log_level, tracing::Level::TRACE);
        assert_eq!(config.output_format, OutputFormat::JsonCompact);

        assert!(config_from_lookup(|_| Some("loud".into())).is_err());
    }

    #[test]
    fn init_twice_is_harmless() {
        let _ = init_subscriber(SubscriberConfig::default());
        assert!(init_subscriber(SubscriberConfig::debug()).is_ok());
    }
}
