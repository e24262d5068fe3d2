//! Anthropic Messages API
//!
//! Streams `/v1/messages` over SSE. Extended thinking is requested with a
//! token budget derived from the reasoning effort.

mod client;
mod streaming;
mod transformers;

pub use client::AnthropicAdapter;
pub use streaming::AnthropicStreamDecoder;
pub use transformers::{build_messages, build_tools, API_VERSION, DEFAULT_MAX_TOKENS};
