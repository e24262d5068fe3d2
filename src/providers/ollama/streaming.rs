//! Ollama stream decoding
//!
//! One JSON object per line. `message.thinking` is reasoning,
//! `message.content` is content, tool calls arrive whole and `done: true`
//! ends the stream.

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::providers::http::envelope_message;
use crate::streaming::{parse_payload, DecodedEvent, WireDecoder};
use crate::types::{RawDelta, ToolCallFragment};

#[derive(Debug, Deserialize)]
struct ChatLine {
    #[serde(default)]
    message: Option<LineMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct LineMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<LineToolCall>>,
}

#[derive(Debug, Deserialize)]
struct LineToolCall {
    function: LineFunction,
}

#[derive(Debug, Deserialize)]
struct LineFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Default)]
pub struct OllamaStreamDecoder {
    next_index: u32,
}

impl OllamaStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn convert_message(&mut self, message: LineMessage) -> Option<RawDelta> {
        let tool_calls = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let arguments = match call.function.arguments {
                    Value::Null => "{}".to_string(),
                    // Some models send the arguments pre-encoded.
                    Value::String(encoded) => encoded,
                    other => other.to_string(),
                };
                let fragment = ToolCallFragment::new(self.next_index)
                    .with_name(call.function.name)
                    .with_arguments(arguments);
                self.next_index += 1;
                fragment
            })
            .collect();
        let delta = RawDelta {
            content: message.content.filter(|text| !text.is_empty()),
            reasoning: message.thinking.filter(|text| !text.is_empty()),
            tool_calls,
        };
        (!delta.is_empty()).then_some(delta)
    }
}

impl WireDecoder for OllamaStreamDecoder {
    fn convert_payload(&mut self, payload: &str) -> Vec<Result<DecodedEvent, LlmError>> {
        let value: Value = match parse_payload(payload) {
            Ok(value) => value,
            Err(error) => return vec![Err(error)],
        };
        if value.get("error").is_some() {
            let message = envelope_message(&value, false)
                .unwrap_or_else(|| "The backend reported an unknown error".to_string());
            return vec![Ok(DecodedEvent::UpstreamError(message))];
        }

        let line = match serde_json::from_value::<ChatLine>(value) {
            Ok(line) => line,
            Err(error) => {
                return vec![Err(LlmError::MalformedPayload(format!(
                    "Unexpected Ollama line: {error}"
                )))];
            }
        };
        tracing::debug!(done = line.done, "Ollama line");

        let mut events = Vec::new();
        if let Some(delta) = line.message.and_then(|message| self.convert_message(message)) {
            events.push(Ok(DecodedEvent::Delta(delta)));
        }
        if line.done {
            events.push(Ok(DecodedEvent::End));
        }
        events
    }
}
