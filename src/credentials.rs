//! Credential lookup
//!
//! The engine never stores keys; it asks a `CredentialProvider` by
//! credential name (e.g. `OPENAI_API_KEY`) and checks `can_proceed` before
//! any network attempt.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};

/// Answer to "may this request go ahead?"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub ok: bool,
    /// Human-readable reason when `ok` is false
    pub reason: Option<String>,
}

impl Readiness {
    pub fn ready() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn blocked(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

pub trait CredentialProvider: Send + Sync {
    fn api_key(&self, name: &str) -> Option<SecretString>;

    /// Default: ready when a non-empty key exists.
    fn can_proceed(&self, name: &str) -> Readiness {
        match self.api_key(name) {
            Some(key) if !key.expose_secret().trim().is_empty() => Readiness::ready(),
            _ => Readiness::blocked(format!("missing {name}")),
        }
    }
}

/// Credential names read by `StaticCredentials::from_env`.
pub const KNOWN_CREDENTIALS: &[&str] = &[
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GOOGLE_API_KEY",
    "OPENROUTER_API_KEY",
    "XAI_API_KEY",
];

/// Fixed name -> key map
#[derive(Default, Clone)]
pub struct StaticCredentials {
    keys: HashMap<String, SecretString>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.keys.keys().collect();
        names.sort();
        f.debug_struct("StaticCredentials")
            .field("names", &names)
            .finish()
    }
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys
            .insert(name.into(), SecretString::from(key.into()));
        self
    }

    pub fn from_env() -> Self {
        KNOWN_CREDENTIALS
            .iter()
            .filter_map(|name| {
                std::env::var(name)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (*name, v))
            })
            .fold(Self::new(), |creds, (name, key)| creds.with_key(name, key))
    }
}

impl CredentialProvider for StaticCredentials {
    fn api_key(&self, name: &str) -> Option<SecretString> {
        self.keys.get(name).cloned()
    }
}
