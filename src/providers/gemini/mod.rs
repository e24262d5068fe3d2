//! Google Gemini
//!
//! Streams `models/{model}:streamGenerateContent?alt=sse`. Function calls
//! arrive whole, so each one becomes a single complete tool call fragment.

mod client;
mod streaming;
mod transformers;

pub use client::GeminiAdapter;
pub use streaming::GeminiStreamDecoder;
pub use transformers::{build_contents, build_tools, sanitize_schema};
