//! HTTP handshake helpers
//!
//! Sends the streaming POST with the engine's retry policy and turns a
//! failed status into the right `LlmError`. Retries only ever cover the
//! handshake; once a response body is streaming it is never replayed.

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

use super::AdapterShared;
use crate::error::LlmError;

/// The optional reasoning parameter carried by a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReasoningParam {
    pub name: &'static str,
    /// Lowercase substrings that identify the parameter in an error body
    pub mentions: &'static [&'static str],
}

impl ReasoningParam {
    fn mentioned_in(&self, body: &str) -> bool {
        let body = body.to_lowercase();
        self.mentions.iter().any(|needle| body.contains(needle))
    }
}

/// One streaming POST.
#[derive(Debug, Clone)]
pub(crate) struct StreamPost {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
    /// Set when `body` includes a reasoning parameter
    pub reasoning: Option<ReasoningParam>,
}

/// Auth headers first, then the caller's extra headers.
pub(crate) fn build_headers(
    auth: &[(&str, &str)],
    extra: &HashMap<String, String>,
) -> Result<HeaderMap, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let pairs = auth
        .iter()
        .map(|(name, value)| (*name, *value))
        .chain(extra.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    for (name, value) in pairs {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid header name `{name}`: {e}")))?;
        let mut header_value = HeaderValue::from_str(value).map_err(|e| {
            LlmError::ConfigurationError(format!("Invalid value for header `{name}`: {e}"))
        })?;
        if is_sensitive(&header_name) {
            header_value.set_sensitive(true);
        }
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn is_sensitive(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "authorization" | "x-api-key" | "x-goog-api-key"
    )
}

/// POST with retries, returning the response once its status is a success.
pub(crate) async fn send_streaming(
    shared: &AdapterShared,
    post: &StreamPost,
) -> Result<reqwest::Response, LlmError> {
    shared
        .config
        .retry
        .execute(|| {
            let builder = shared
                .http
                .post(&post.url)
                .headers(post.headers.clone())
                .json(&post.body);
            send_once(builder, post.reasoning)
        })
        .await
}

async fn send_once(
    builder: reqwest::RequestBuilder,
    reasoning: Option<ReasoningParam>,
) -> Result<reqwest::Response, LlmError> {
    let response = builder.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &body, reasoning))
}

/// Map a non-success status and its body to an error.
pub(crate) fn classify_failure(
    status: u16,
    body: &str,
    reasoning: Option<ReasoningParam>,
) -> LlmError {
    let message = failure_message(status, body);
    match status {
        400 | 422 => match reasoning {
            Some(param) if param.mentioned_in(body) => LlmError::ParameterRejection {
                parameter: param.name.to_string(),
                message,
            },
            _ => LlmError::http(status, message),
        },
        401 | 403 => LlmError::AuthenticationError(message),
        429 => LlmError::RateLimitError(message),
        _ => LlmError::http(status, message),
    }
}

fn failure_message(status: u16, body: &str) -> String {
    let from_envelope = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| envelope_message(&value, false));
    match from_envelope {
        Some(message) => message,
        None if body.trim().is_empty() => format!("request failed with status {status}"),
        None => body.trim().chars().take(500).collect(),
    }
}

/// Message of a vendor error envelope.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}`,
/// `{"message": ..}` and a one-element array around any of these. With
/// `with_type`, a typed error renders as `"<type>: <message>"`.
pub(crate) fn envelope_message(value: &Value, with_type: bool) -> Option<String> {
    if let Some(first) = value.as_array().and_then(|items| items.first()) {
        return envelope_message(first, with_type);
    }
    match value.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(error @ Value::Object(_)) => {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            let kind = error.get("type").and_then(Value::as_str);
            Some(match kind {
                Some(kind) if with_type => format!("{kind}: {message}"),
                _ => message,
            })
        }
        _ => value
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}
