//! Anthropic stream decoding
//!
//! Event types handled:
//! - `content_block_start`: tool_use id and name, redacted thinking
//! - `content_block_delta`: text, thinking and tool input JSON deltas
//! - `message_stop`: end of stream
//! - `error`: upstream error rendered as `"<type>: <message>"`
//!
//! `ping`, signature deltas and usage updates carry nothing we surface.

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::providers::http::envelope_message;
use crate::streaming::{parse_payload, DecodedEvent, WireDecoder};
use crate::types::{RawDelta, ToolCallFragment};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {},
    ContentBlockStart {
        index: u32,
        content_block: ContentBlock,
    },
    ContentBlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    ContentBlockStop {},
    MessageDelta {},
    MessageStop {},
    Ping {},
    Error {},
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    RedactedThinking {},
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

/// Decoder for Messages API streams.
#[derive(Debug)]
pub struct AnthropicStreamDecoder {
    redaction_placeholder: String,
    redaction_sent: bool,
}

impl AnthropicStreamDecoder {
    /// `redaction_placeholder` stands in for `redacted_thinking` blocks.
    pub fn new(redaction_placeholder: impl Into<String>) -> Self {
        Self {
            redaction_placeholder: redaction_placeholder.into(),
            redaction_sent: false,
        }
    }

    fn convert_event(&mut self, event: StreamEvent) -> Option<DecodedEvent> {
        let delta = match event {
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlock::ToolUse { id, name } => {
                    RawDelta::tool_call(ToolCallFragment::new(index).with_id(id).with_name(name))
                }
                ContentBlock::RedactedThinking {} if !self.redaction_sent => {
                    self.redaction_sent = true;
                    RawDelta::reasoning(self.redaction_placeholder.clone())
                }
                ContentBlock::Text { text } => RawDelta::content(text),
                ContentBlock::Thinking { thinking } => RawDelta::reasoning(thinking),
                _ => return None,
            },
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                BlockDelta::TextDelta { text } => RawDelta::content(text),
                BlockDelta::ThinkingDelta { thinking } => RawDelta::reasoning(thinking),
                BlockDelta::InputJsonDelta { partial_json } => {
                    RawDelta::tool_call(ToolCallFragment::new(index).with_arguments(partial_json))
                }
                BlockDelta::Other => return None,
            },
            StreamEvent::MessageStop {} => return Some(DecodedEvent::End),
            _ => return None,
        };
        (!delta.is_empty()).then_some(DecodedEvent::Delta(delta))
    }
}

impl WireDecoder for AnthropicStreamDecoder {
    fn convert_payload(&mut self, payload: &str) -> Vec<Result<DecodedEvent, LlmError>> {
        let value: Value = match parse_payload(payload) {
            Ok(value) => value,
            Err(error) => return vec![Err(error)],
        };
        if value.get("type").and_then(Value::as_str) == Some("error") {
            let message = envelope_message(&value, true)
                .unwrap_or_else(|| "The backend reported an unknown error".to_string());
            return vec![Ok(DecodedEvent::UpstreamError(message))];
        }

        match serde_json::from_value::<StreamEvent>(value) {
            Ok(event) => {
                tracing::debug!(event = ?event, "Anthropic stream event");
                self.convert_event(event).map(Ok).into_iter().collect()
            }
            Err(error) => vec![Err(LlmError::MalformedPayload(format!(
                "Unexpected Anthropic event: {error}"
            )))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoder() -> AnthropicStreamDecoder {
        AnthropicStreamDecoder::new("hidden")
    }

    fn decode_all(decoder: &mut AnthropicStreamDecoder, payloads: &[&str]) -> Vec<DecodedEvent> {
        payloads
            .iter()
            .flat_map(|payload| decoder.convert_payload(payload))
            .map(|event| event.expect("decodable payload"))
            .collect()
    }

    #[test]
    fn text_and_thinking_deltas() {
        let events = decode_all(
            &mut decoder(),
            &[
                r#"{"type":"message_start","message":{"id":"msg_1","model":"claude","content":[]}}"#,
                r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#,
                r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"Let me see"}}"#,
                r#"{"type":"content_block_delta","index":0,"delta":{"type":"signature_delta","signature":"abc"}}"#,
                r#"{"type":"content_block_stop","index":0}"#,
                r#"{"type":"ping"}"#,
                r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Hi"}}"#,
                r#"{"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":5}}"#,
                r#"{"type":"message_stop"}"#,
            ],
        );
        assert_eq!(
            events,
            vec![
                DecodedEvent::Delta(RawDelta::reasoning("Let me see")),
                DecodedEvent::Delta(RawDelta::content("Hi")),
                DecodedEvent::End,
            ]
        );
    }

    #[test]
    fn tool_use_blocks_become_indexed_fragments() {
        let events = decode_all(
            &mut decoder(),
            &[
                r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"web__search","input":{}}}"#,
                r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"q\":"}}"#,
                r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"\"rust\"}"}}"#,
            ],
        );
        assert_eq!(
            events[0],
            DecodedEvent::Delta(RawDelta::tool_call(
                ToolCallFragment::new(1).with_id("toolu_1").with_name("web__search")
            ))
        );
        assert_eq!(
            events[2],
            DecodedEvent::Delta(RawDelta::tool_call(
                ToolCallFragment::new(1).with_arguments("\"rust\"}")
            ))
        );
    }

    #[test]
    fn redacted_thinking_is_a_placeholder_once() {
        let block = r#"{"type":"content_block_start","index":0,"content_block":{"type":"redacted_thinking","data":"xyz"}}"#;
        let events = decode_all(&mut decoder(), &[block, block]);
        assert_eq!(events, vec![DecodedEvent::Delta(RawDelta::reasoning("hidden"))]);
    }

    #[test]
    fn error_events_are_unwrapped() {
        let events = decoder().convert_payload(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert!(matches!(
            events.as_slice(),
            [Ok(DecodedEvent::UpstreamError(m))] if m == "overloaded_error: Overloaded"
        ));
    }

    #[test]
    fn unknown_events_are_ignored() {
        assert!(decoder()
            .convert_payload(r#"{"type":"future_event","index":3}"#)
            .is_empty());
        assert!(matches!(
            decoder().convert_payload("not json").as_slice(),
            [Err(LlmError::MalformedPayload(_))]
        ));
    }
}
