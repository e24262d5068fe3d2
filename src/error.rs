//! Error Handling Module
//!
//! A single error type, `LlmError`, covers every failure the engine can
//! observe. Only `user_message()` crosses the callback boundary; the enum
//! itself stays inside the crate and its callers.
//!
//! # Example
//!
//! ```rust,ignore
//! use unistream::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::http(503, "Service Unavailable");
//! assert_eq!(error.category(), ErrorCategory::Server);
//! assert!(error.is_retryable());
//! ```

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Coarse classification used for retry decisions and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    RateLimit,
    Client,
    Server,
    Network,
    Parsing,
    Upstream,
    Timeout,
    Process,
    Internal,
}

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// Missing or invalid credential / configuration. Raised before any network attempt.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// The backend returned a structured error payload.
    #[error("{0}")]
    UpstreamError(String),

    /// A stream chunk could not be parsed. Never fatal on its own.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The backend refused an optional request parameter.
    #[error("Parameter `{parameter}` rejected: {message}")]
    ParameterRejection { parameter: String, message: String },

    #[error("{0}")]
    TimeoutError(String),

    /// Stream or process ended with a non-zero status.
    #[error("Process exited with code {code}")]
    ExitFailure {
        code: i32,
        diagnostics: Option<String>,
    },

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl LlmError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::HttpError {
            status,
            message: message.into(),
        }
    }

    pub fn missing_credential(name: &str) -> Self {
        Self::ConfigurationError(format!(
            "No API key configured for {name}. Add one in settings to use this model."
        ))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) => ErrorCategory::RateLimit,
            Self::HttpError { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            Self::ParameterRejection { .. } => ErrorCategory::Client,
            Self::ConnectionError(_) | Self::StreamError(_) => ErrorCategory::Network,
            Self::MalformedPayload(_) => ErrorCategory::Parsing,
            Self::UpstreamError(_) => ErrorCategory::Upstream,
            Self::TimeoutError(_) => ErrorCategory::Timeout,
            Self::ExitFailure { .. } => ErrorCategory::Process,
            Self::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// Whether a fresh attempt at the handshake could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The single human-readable string handed to `on_error`.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationError(msg)
            | Self::UpstreamError(msg)
            | Self::TimeoutError(msg) => msg.clone(),
            Self::ExitFailure {
                diagnostics: Some(text),
                ..
            } if !text.trim().is_empty() => text.trim().to_string(),
            Self::ExitFailure { code, .. } => {
                format!("Process exited with code {code} without producing a response")
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TimeoutError(format!("Request timed out: {err}"))
        } else if err.is_connect() {
            Self::ConnectionError(err.to_string())
        } else if let Some(status) = err.status() {
            Self::http(status.as_u16(), err.to_string())
        } else {
            Self::StreamError(err.to_string())
        }
    }
}
