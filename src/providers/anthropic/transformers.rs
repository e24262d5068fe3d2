//! Request body construction for the Messages API

use serde_json::{json, Value};

use crate::formatting::{thinking_budget, FormattedMessage, MediaPart};
use crate::providers::http::ReasoningParam;
use crate::providers::{AdapterRequest, RequestOptions};
use crate::types::{AttachmentKind, Role, ToolDefinition};

pub const API_VERSION: &str = "2023-06-01";

/// Answer budget on top of any thinking budget.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

pub(crate) const THINKING: ReasoningParam = ReasoningParam {
    name: "thinking",
    mentions: &["thinking"],
};

pub(crate) fn build_messages_body(
    request: &AdapterRequest,
    options: RequestOptions,
) -> (Value, Option<ReasoningParam>) {
    let mut body = json!({
        "model": request.model(),
        "max_tokens": DEFAULT_MAX_TOKENS,
        "messages": build_messages(&request.messages),
        "stream": true,
    });
    if let Some(system) = request
        .config
        .system_prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
    {
        body["system"] = json!(system);
    }
    if !request.config.tools.is_empty() {
        body["tools"] = Value::Array(build_tools(&request.config.tools));
    }

    if !(options.reasoning_params && request.show_thoughts()) {
        return (body, None);
    }
    let budget = thinking_budget(request.config.reasoning_effort);
    body["thinking"] = json!({ "type": "enabled", "budget_tokens": budget });
    body["max_tokens"] = json!(budget + DEFAULT_MAX_TOKENS);
    (body, Some(THINKING))
}

pub fn build_messages(messages: &[FormattedMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| match message.role {
            Role::User => json!({ "role": "user", "content": user_blocks(message) }),
            Role::Assistant => {
                let mut blocks = Vec::new();
                if !message.text.is_empty() {
                    blocks.push(json!({ "type": "text", "text": message.text }));
                }
                blocks.extend(message.tool_calls.iter().map(|call| {
                    json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.namespaced_name,
                        "input": call.arguments,
                    })
                }));
                json!({ "role": "assistant", "content": blocks })
            }
            Role::ToolResults => {
                let blocks: Vec<Value> = message
                    .tool_results
                    .iter()
                    .map(|result| {
                        json!({
                            "type": "tool_result",
                            "tool_use_id": result.tool_call_id,
                            "content": result.content,
                        })
                    })
                    .collect();
                json!({ "role": "user", "content": blocks })
            }
        })
        .collect()
}

/// Media blocks first, then the text.
fn user_blocks(message: &FormattedMessage) -> Value {
    if message.media.is_empty() {
        return json!(message.text);
    }
    let mut blocks: Vec<Value> = message.media.iter().map(media_block).collect();
    if !message.text.is_empty() {
        blocks.push(json!({ "type": "text", "text": message.text }));
    }
    Value::Array(blocks)
}

fn media_block(part: &MediaPart) -> Value {
    let block_type = match part.kind {
        AttachmentKind::Pdf => "document",
        _ => "image",
    };
    json!({
        "type": block_type,
        "source": {
            "type": "base64",
            "media_type": part.mime_type,
            "data": part.base64,
        }
    })
}

pub fn build_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.namespaced_name(),
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}
