//! Claude Code
//!
//! Runs over a notify channel instead of HTTP: the adapter subscribes to the
//! request id, asks the producer to start, and decodes the CLI's JSON
//! messages. Tool use is surfaced as inline tool-call markers.

mod client;
mod streaming;
mod transformers;

pub use client::ClaudeCodeAdapter;
pub use streaming::ClaudeCodeStreamDecoder;
pub use transformers::build_start_payload;
