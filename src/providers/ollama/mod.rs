//! Ollama
//!
//! Streams `/api/chat` as newline-delimited JSON from a local server. No
//! credential is needed.

mod client;
mod streaming;
mod transformers;

pub use client::OllamaAdapter;
pub use streaming::OllamaStreamDecoder;
pub use transformers::build_messages;
