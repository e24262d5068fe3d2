//! OpenAI-compatible chat completions
//!
//! Serves OpenAI itself plus every backend that speaks the same streaming
//! wire format. The flavors differ only in endpoint, credential and how the
//! reasoning parameter is spelled.

mod client;
mod streaming;
mod transformers;

pub use client::OpenAiAdapter;
pub use streaming::OpenAiStreamDecoder;
pub use transformers::{build_messages, build_tools};

use super::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiFlavor {
    OpenAi,
    OpenRouter,
    /// x.ai
    Grok,
    /// Local LM Studio server
    LmStudio,
}

impl OpenAiFlavor {
    pub fn backend(&self) -> Backend {
        match self {
            Self::OpenAi => Backend::OpenAi,
            Self::OpenRouter => Backend::OpenRouter,
            Self::Grok => Backend::Grok,
            Self::LmStudio => Backend::LmStudio,
        }
    }
}
