//! Streaming Module
//!
//! Everything between a raw vendor event source and the caller's callbacks:
//! - raw and decoded event types, and the `WireDecoder` seam
//! - HTTP (SSE / NDJSON) and notify-channel transports
//! - the reasoning classifier and tool call accumulator
//! - the lifecycle controller and the driver loop

mod callbacks;
mod cancel;
mod channel;
mod driver;
mod events;
mod lifecycle;
mod reasoning;
mod tool_calls;
mod transport;

pub use callbacks::*;
pub use cancel::*;
pub use channel::*;
pub use driver::*;
pub use events::*;
pub use lifecycle::*;
pub use reasoning::*;
pub use tool_calls::*;
pub use transport::*;
