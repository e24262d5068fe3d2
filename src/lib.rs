//! # unistream
//!
//! Streaming response normalization for heterogeneous LLM backends.
//!
//! Every backend's incremental output (SSE, NDJSON or a notify channel) is
//! decoded into one ordered protocol delivered through [`StreamCallbacks`]:
//!
//! - plain text chunks;
//! - reasoning spans wrapped in `<think>` / `</think><thinkmeta seconds="N"/>`;
//! - assembled tool calls, reported once on completion.
//!
//! Exactly one of `on_complete` or `on_error` fires per request.
#![deny(unsafe_code)]

//! ## Quick Start
//!
//! ```rust,ignore
//! use unistream::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), LlmError> {
//!     let engine = StreamEngine::builder()
//!         .credentials(StaticCredentials::from_env())
//!         .build()?;
//!     let config = GenerationConfig::new("openrouter::deepseek/deepseek-r1")?
//!         .with_show_thoughts(true);
//!
//!     let collected = engine.collect(&[Message::user("Why is the sky blue?")], &config).await;
//!     println!("{}", collected.transcript());
//!     Ok(())
//! }
//! ```

pub mod capabilities;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod formatting;
pub mod markers;
pub mod providers;
pub mod retry;
pub mod streaming;
pub mod telemetry;
pub mod types;

pub use config::EngineConfig;
pub use engine::{StreamEngine, StreamEngineBuilder};
pub use error::LlmError;
pub use providers::{Backend, ProviderAdapter};
pub use streaming::{CancelHandle, LifecycleState, StreamCallbacks};

/// Commonly used items
pub mod prelude {
    pub use crate::capabilities::{CapabilityTable, ModelCapabilities};
    pub use crate::config::EngineConfig;
    pub use crate::credentials::{CredentialProvider, StaticCredentials};
    pub use crate::engine::StreamEngine;
    pub use crate::error::LlmError;
    pub use crate::formatting::{AttachmentResolver, MemoryAttachmentResolver};
    pub use crate::providers::Backend;
    pub use crate::streaming::{
        CancelHandle, ChannelEvent, ChannelHub, CollectedOutcome, CollectingCallbacks,
        LifecycleState, NotifyChannel, StreamCallbacks,
    };
    pub use crate::types::{
        Attachment, AttachmentKind, GenerationConfig, Message, ReasoningEffort, Role,
        ToolCallResult, ToolDefinition,
    };
}
