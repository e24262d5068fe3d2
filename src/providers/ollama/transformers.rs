//! Request body construction for `/api/chat`

use serde_json::{json, Value};

use crate::formatting::FormattedMessage;
use crate::providers::http::ReasoningParam;
use crate::providers::openai::build_tools;
use crate::providers::{AdapterRequest, RequestOptions};
use crate::types::Role;

pub(crate) const THINK: ReasoningParam = ReasoningParam {
    name: "think",
    mentions: &["think"],
};

pub(crate) fn build_chat_body(
    request: &AdapterRequest,
    options: RequestOptions,
) -> (Value, Option<ReasoningParam>) {
    let mut body = json!({
        "model": request.model(),
        "messages": build_messages(request.config.system_prompt.as_deref(), &request.messages),
        "stream": true,
    });
    // Ollama takes the same function tool shape as chat completions.
    if !request.config.tools.is_empty() {
        body["tools"] = Value::Array(build_tools(&request.config.tools));
    }

    if !options.reasoning_params {
        return (body, None);
    }
    if request.show_thoughts() {
        body["think"] = json!(true);
    } else if request.capabilities.can_disable_reasoning {
        body["think"] = json!(false);
    } else {
        return (body, None);
    }
    (body, Some(THINK))
}

pub fn build_messages(system_prompt: Option<&str>, messages: &[FormattedMessage]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
        out.push(json!({ "role": "system", "content": prompt }));
    }
    for message in messages {
        match message.role {
            Role::User => {
                let mut entry = json!({ "role": "user", "content": message.text });
                if !message.media.is_empty() {
                    entry["images"] = message
                        .media
                        .iter()
                        .map(|part| Value::String(part.base64.clone()))
                        .collect();
                }
                out.push(entry);
            }
            Role::Assistant => {
                let mut entry = json!({ "role": "assistant", "content": message.text });
                if !message.tool_calls.is_empty() {
                    entry["tool_calls"] = message
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "function": {
                                    "name": call.namespaced_name,
                                    "arguments": call.arguments,
                                }
                            })
                        })
                        .collect();
                }
                out.push(entry);
            }
            Role::ToolResults => {
                out.extend(message.tool_results.iter().map(|result| {
                    json!({
                        "role": "tool",
                        "content": result.content,
                        "tool_name": result.namespaced_name,
                    })
                }));
            }
        }
    }
    out
}
