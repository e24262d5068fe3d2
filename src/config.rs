//! Engine configuration
//!
//! `EngineConfig` holds the tunables shared by every request: classifier
//! windows, the lifecycle timeout, the exit-status leniency switch and
//! per-backend endpoint overrides.
//!
//! The probe window and detection threshold trade latency for accuracy: a
//! larger threshold holds reasoning back longer before deciding that no
//! inline tags are coming.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub mod defaults {
    use std::time::Duration;

    pub const PROBE_WINDOW: usize = 96;
    pub const DETECT_THRESHOLD: usize = 128;
    pub const TIMEOUT: Duration = Duration::from_secs(300);
    pub const REDACTION_PLACEHOLDER: &str = "Reasoning is hidden for this model.";
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("unistream/", env!("CARGO_PKG_VERSION"));
}

/// Engine-wide tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Characters of reasoning text inspected for inline tags
    pub probe_window: usize,
    /// Buffered reasoning length after which tags are assumed absent
    pub detect_threshold: usize,
    /// Ceiling on the wait for a terminal signal
    #[serde(with = "duration_secs_serde")]
    pub timeout: Duration,
    #[serde(with = "duration_secs_serde")]
    pub connect_timeout: Duration,
    /// Text shown instead of redacted reasoning
    pub redaction_placeholder: String,
    /// Treat a non-zero exit as success when content was produced
    pub complete_on_exit_with_content: bool,
    /// Endpoint overrides keyed by backend id
    pub base_urls: HashMap<String, String>,
    #[serde(skip)]
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            probe_window: defaults::PROBE_WINDOW,
            detect_threshold: defaults::DETECT_THRESHOLD,
            timeout: defaults::TIMEOUT,
            connect_timeout: defaults::CONNECT_TIMEOUT,
            redaction_placeholder: defaults::REDACTION_PLACEHOLDER.to_string(),
            complete_on_exit_with_content: true,
            base_urls: HashMap::new(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `UNISTREAM_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(secs) = parse_env::<u64>(&lookup, "UNISTREAM_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(window) = parse_env::<usize>(&lookup, "UNISTREAM_PROBE_WINDOW") {
            self.probe_window = window;
        }
        if let Some(threshold) = parse_env::<usize>(&lookup, "UNISTREAM_DETECT_THRESHOLD") {
            self.detect_threshold = threshold;
        }
        for backend in crate::providers::Backend::ALL
            .iter()
            .filter(|backend| backend.is_http())
        {
            let key = format!(
                "UNISTREAM_{}_BASE_URL",
                backend.as_str().to_uppercase().replace('-', "_")
            );
            if let Some(url) = lookup(&key).filter(|v| !v.trim().is_empty()) {
                self.base_urls
                    .insert(backend.as_str().to_string(), url.trim().to_string());
            }
        }
        self
    }

    pub fn with_probe_window(mut self, chars: usize) -> Self {
        self.probe_window = chars;
        self
    }

    pub fn with_detect_threshold(mut self, chars: usize) -> Self {
        self.detect_threshold = chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_redaction_placeholder(mut self, text: impl Into<String>) -> Self {
        self.redaction_placeholder = text.into();
        self
    }

    pub fn with_complete_on_exit_with_content(mut self, lenient: bool) -> Self {
        self.complete_on_exit_with_content = lenient;
        self
    }

    pub fn with_base_url(mut self, backend: impl Into<String>, url: impl Into<String>) -> Self {
        self.base_urls.insert(backend.into(), url.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url_for(&self, backend: &str) -> Option<&str> {
        self.base_urls.get(backend).map(String::as_str)
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

mod duration_secs_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
