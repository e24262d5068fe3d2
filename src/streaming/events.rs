//! Raw and decoded stream events
//!
//! Every transport (HTTP SSE, NDJSON, notify channel) is reduced to a
//! `RawEventStream`, so decoding and classification never depend on how the
//! bytes were delivered.

use std::pin::Pin;

use futures::Stream;

use crate::error::LlmError;
use crate::types::RawDelta;

/// One transport-level event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A payload to hand to the wire decoder
    Data(String),
    /// A transport or structured process error
    Error(String),
    /// Diagnostic text from the producer
    Stderr(String),
    /// Logical end of stream with an optional exit status
    Done { exit_code: Option<i32> },
}

/// Boxed raw event source. Dropping it releases the subscription.
pub type RawEventStream = Pin<Box<dyn Stream<Item = RawEvent> + Send>>;

/// Output of a wire decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    /// A new assistant message begins; reasoning detection starts over
    MessageStart,
    Delta(RawDelta),
    /// Structured error reported by the backend; message is shown verbatim
    UpstreamError(String),
    /// The backend signalled completion
    End,
}

/// Converts vendor payloads into decoded events.
///
/// A single payload may yield several events (for example content followed
/// by `End`). Decoders are stateful and used for exactly one request.
pub trait WireDecoder: Send {
    /// Decode one payload. Malformed payloads return `Err(MalformedPayload)`,
    /// which the driver logs and skips.
    fn convert_payload(&mut self, payload: &str) -> Vec<Result<DecodedEvent, LlmError>>;

    /// Called once when the transport reports `Done`.
    fn handle_stream_end(&mut self) -> Vec<DecodedEvent> {
        Vec::new()
    }
}

/// Parse a payload as JSON, mapping failures to `MalformedPayload`.
pub(crate) fn parse_payload<T: serde::de::DeserializeOwned>(payload: &str) -> Result<T, LlmError> {
    serde_json::from_str(payload).map_err(|e| {
        let preview: String = payload.chars().take(120).collect();
        LlmError::MalformedPayload(format!("{e} in payload `{preview}`"))
    })
}
