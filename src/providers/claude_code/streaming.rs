//! Claude Code stream decoding
//!
//! Each data payload holds one or more JSON lines from the CLI. Assistant
//! messages are complete and cumulative: the same message id is re-sent
//! with longer blocks, so every block is diffed against what was already
//! emitted for its `(message id, position)` and only the new suffix goes
//! out. A change of message id is reported as `MessageStart`, since one run
//! can hold several assistant turns, each with its own thinking.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::markers::tool_call_marker;
use crate::streaming::{parse_payload, DecodedEvent, WireDecoder};
use crate::types::RawDelta;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CliMessage {
    Assistant {
        message: AssistantMessage,
    },
    Result {
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        result: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default)]
pub struct ClaudeCodeStreamDecoder {
    /// Bytes already emitted per (message id, block position)
    emitted: HashMap<(String, usize), usize>,
    tool_uses: HashSet<String>,
    anonymous_messages: usize,
    current_message: Option<String>,
    text_seen: bool,
    finished: bool,
}

impl ClaudeCodeStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_suffix(&mut self, key: (String, usize), text: &str) -> Option<String> {
        let sent = self.emitted.entry(key).or_insert(0);
        let suffix = text.get(*sent..).filter(|suffix| !suffix.is_empty())?;
        *sent = text.len();
        Some(suffix.to_string())
    }

    fn convert_assistant(&mut self, message: AssistantMessage) -> Vec<DecodedEvent> {
        let message_id = message.id.unwrap_or_else(|| {
            self.anonymous_messages += 1;
            format!("anonymous-{}", self.anonymous_messages)
        });
        let mut events = Vec::new();
        if self.current_message.as_deref() != Some(message_id.as_str()) {
            self.current_message = Some(message_id.clone());
            events.push(DecodedEvent::MessageStart);
        }
        let mut delta = RawDelta::default();
        for (position, block) in message.content.into_iter().enumerate() {
            let key = (message_id.clone(), position);
            match block {
                Block::Text { text } => {
                    if let Some(suffix) = self.new_suffix(key, &text) {
                        self.text_seen = true;
                        delta.content.get_or_insert_with(String::new).push_str(&suffix);
                    }
                }
                Block::Thinking { thinking } => {
                    if let Some(suffix) = self.new_suffix(key, &thinking) {
                        delta.reasoning.get_or_insert_with(String::new).push_str(&suffix);
                    }
                }
                Block::ToolUse { id, name, input } => {
                    if self.tool_uses.insert(id) {
                        let input = if input.is_null() {
                            Value::Object(Default::default())
                        } else {
                            input
                        };
                        delta
                            .content
                            .get_or_insert_with(String::new)
                            .push_str(&tool_call_marker(&name, &input));
                    }
                }
                Block::Other => {}
            }
        }
        if !delta.is_empty() {
            events.push(DecodedEvent::Delta(delta));
        }
        events
    }

    fn convert_line(&mut self, line: &str) -> Vec<Result<DecodedEvent, LlmError>> {
        let message: CliMessage = match parse_payload(line) {
            Ok(message) => message,
            Err(error) => return vec![Err(error)],
        };
        match message {
            CliMessage::Assistant { message } => {
                self.convert_assistant(message).into_iter().map(Ok).collect()
            }
            CliMessage::Result {
                is_error,
                subtype,
                result,
            } => {
                self.finished = true;
                let result = result.filter(|text| !text.trim().is_empty());
                if is_error {
                    let message = result.unwrap_or_else(|| {
                        format!(
                            "Claude Code run failed ({})",
                            subtype.as_deref().unwrap_or("error")
                        )
                    });
                    return vec![Ok(DecodedEvent::UpstreamError(message))];
                }
                let mut events = Vec::new();
                if let Some(text) = result.filter(|_| !self.text_seen) {
                    events.push(Ok(DecodedEvent::Delta(RawDelta::content(text))));
                }
                events.push(Ok(DecodedEvent::End));
                events
            }
            CliMessage::Other => Vec::new(),
        }
    }
}

impl WireDecoder for ClaudeCodeStreamDecoder {
    fn convert_payload(&mut self, payload: &str) -> Vec<Result<DecodedEvent, LlmError>> {
        payload
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .flat_map(|line| {
                if self.finished {
                    tracing::debug!("Ignoring Claude Code output after result");
                    return Vec::new();
                }
                self.convert_line(line)
            })
            .collect()
    }
}
