//! Gemini stream decoding
//!
//! Each payload is a `GenerateContentResponse`. Parts flagged `thought` are
//! reasoning; other text parts are content; a `functionCall` part is a whole
//! tool call and takes the next free index.

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::providers::http::envelope_message;
use crate::streaming::{parse_payload, DecodedEvent, WireDecoder};
use crate::types::{RawDelta, ToolCallFragment};

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    args: Value,
}

/// Decoder for Gemini SSE streams.
#[derive(Debug, Default)]
pub struct GeminiStreamDecoder {
    next_index: u32,
}

impl GeminiStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn convert_chunk(&mut self, chunk: GenerateChunk) -> Option<RawDelta> {
        let parts = chunk.candidates.into_iter().next()?.content?.parts;
        let mut delta = RawDelta::default();
        for part in parts {
            if let Some(call) = part.function_call {
                let arguments = if call.args.is_null() {
                    "{}".to_string()
                } else {
                    call.args.to_string()
                };
                let mut fragment = ToolCallFragment::new(self.next_index)
                    .with_name(call.name)
                    .with_arguments(arguments);
                fragment.id = call.id;
                self.next_index += 1;
                delta.tool_calls.push(fragment);
                continue;
            }
            let Some(text) = part.text.filter(|text| !text.is_empty()) else {
                continue;
            };
            let target = if part.thought {
                &mut delta.reasoning
            } else {
                &mut delta.content
            };
            target.get_or_insert_with(String::new).push_str(&text);
        }
        (!delta.is_empty()).then_some(delta)
    }
}

impl WireDecoder for GeminiStreamDecoder {
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

        match serde_json::from_value::<GenerateChunk>(value) {
            Ok(chunk) => {
                tracing::debug!(candidates = chunk.candidates.len(), "Gemini chunk");
                self.convert_chunk(chunk)
                    .map(|delta| Ok(DecodedEvent::Delta(delta)))
                    .into_iter()
                    .collect()
            }
            Err(error) => vec![Err(LlmError::MalformedPayload(format!(
                "Unexpected Gemini chunk: {error}"
            )))],
        }
    }
}
