//! OpenAI-compatible stream decoding
//!
//! Each SSE payload is a `chat.completion.chunk`. Only the first choice is
//! read. Reasoning may arrive under several field names depending on the
//! server; the first non-empty one wins, in the order `reasoning_content`,
//! `reasoning`, `thinking`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::providers::http::envelope_message;
use crate::streaming::{parse_payload, DecodedEvent, WireDecoder};
use crate::types::{RawDelta, ToolCallFragment};

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallChunk>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallChunk {
    #[serde(default)]
    index: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionChunk>,
}

#[derive(Debug, Deserialize)]
struct FunctionChunk {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Decoder for `chat/completions` streams.
#[derive(Debug, Default)]
pub struct OpenAiStreamDecoder;

impl OpenAiStreamDecoder {
    pub fn new() -> Self {
        Self
    }

    fn convert_chunk(&self, chunk: ChatChunk) -> Option<RawDelta> {
        let delta = chunk.choices.into_iter().next()?.delta?;

        let reasoning = [delta.reasoning_content, delta.reasoning, delta.thinking]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty());

        let tool_calls = delta
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(position, call)| {
                let function = call.function;
                ToolCallFragment {
                    // Some servers omit the index on single-call chunks.
                    index: call.index.unwrap_or(position as u32),
                    id: call.id,
                    name: function.as_ref().and_then(|f| f.name.clone()),
                    arguments: function.and_then(|f| f.arguments),
                }
            })
            .collect();

        let raw = RawDelta {
            content: delta.content.filter(|text| !text.is_empty()),
            reasoning,
            tool_calls,
        };
        (!raw.is_empty()).then_some(raw)
    }
}

impl WireDecoder for OpenAiStreamDecoder {
    fn convert_payload(&mut self, payload: &str) -> Vec<Result<DecodedEvent, LlmError>> {
        let payload = payload.trim();
        if payload == "[DONE]" {
            return vec![Ok(DecodedEvent::End)];
        }

        let value: Value = match parse_payload(payload) {
            Ok(value) => value,
            Err(error) => return vec![Err(error)],
        };
        if value.get("error").is_some_and(|error| !error.is_null()) {
            let message = envelope_message(&value, false)
                .unwrap_or_else(|| "The backend reported an unknown error".to_string());
            return vec![Ok(DecodedEvent::UpstreamError(message))];
        }

        match serde_json::from_value::<ChatChunk>(value) {
            Ok(chunk) => {
                tracing::debug!(choices = chunk.choices.len(), "Chat completion chunk");
                self.convert_chunk(chunk)
                    .map(|delta| Ok(DecodedEvent::Delta(delta)))
                    .into_iter()
                    .collect()
            }
            Err(error) => vec![Err(LlmError::MalformedPayload(format!(
                "Unexpected chat completion chunk: {error}"
            )))],
        }
    }
}
