//! Request body construction for chat completions

use serde_json::{json, Value};

use super::OpenAiFlavor;
use crate::formatting::FormattedMessage;
use crate::providers::http::ReasoningParam;
use crate::providers::{AdapterRequest, RequestOptions};
use crate::types::{ReasoningEffort, Role, ToolDefinition};

pub(crate) const REASONING_EFFORT: ReasoningParam = ReasoningParam {
    name: "reasoning_effort",
    mentions: &["reasoning_effort", "reasoning effort"],
};

pub(crate) const OPENROUTER_REASONING: ReasoningParam = ReasoningParam {
    name: "reasoning",
    mentions: &["reasoning"],
};

/// Full streaming body plus the reasoning parameter it carries, if any.
pub(crate) fn build_chat_body(
    flavor: OpenAiFlavor,
    request: &AdapterRequest,
    options: RequestOptions,
) -> (Value, Option<ReasoningParam>) {
    let mut body = json!({
        "model": request.model(),
        "messages": build_messages(request.config.system_prompt.as_deref(), &request.messages),
        "stream": true,
    });
    if !request.config.tools.is_empty() {
        body["tools"] = Value::Array(build_tools(&request.config.tools));
    }

    if !options.reasoning_params {
        return (body, None);
    }
    let reasoning = match flavor {
        OpenAiFlavor::OpenAi => request.config.reasoning_effort.map(|effort| {
            body["reasoning_effort"] = json!(effort.as_str());
            REASONING_EFFORT
        }),
        // x.ai only understands low and high.
        OpenAiFlavor::Grok => request.config.reasoning_effort.map(|effort| {
            let effort = match effort {
                ReasoningEffort::Low | ReasoningEffort::Medium => "low",
                ReasoningEffort::High | ReasoningEffort::XHigh => "high",
            };
            body["reasoning_effort"] = json!(effort);
            REASONING_EFFORT
        }),
        OpenAiFlavor::OpenRouter => {
            body["reasoning"] = openrouter_reasoning(request);
            Some(OPENROUTER_REASONING)
        }
        OpenAiFlavor::LmStudio => None,
    };
    (body, reasoning)
}

fn openrouter_reasoning(request: &AdapterRequest) -> Value {
    let effort = request.config.reasoning_effort.unwrap_or_default();
    if request.show_thoughts() {
        json!({ "effort": effort.as_str(), "exclude": false })
    } else if request.capabilities.can_disable_reasoning {
        json!({ "enabled": false })
    } else {
        json!({ "effort": effort.as_str(), "exclude": true })
    }
}

/// Chat messages, system prompt first.
pub fn build_messages(system_prompt: Option<&str>, messages: &[FormattedMessage]) -> Vec<Value> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if let Some(prompt) = system_prompt.filter(|p| !p.trim().is_empty()) {
        out.push(json!({ "role": "system", "content": prompt }));
    }
    for message in messages {
        match message.role {
            Role::User => out.push(json!({ "role": "user", "content": user_content(message) })),
            Role::Assistant => {
                let mut entry = json!({ "role": "assistant", "content": message.text });
                if !message.tool_calls.is_empty() {
                    entry["tool_calls"] = message
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.namespaced_name,
                                    "arguments": call.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    if message.text.is_empty() {
                        entry["content"] = Value::Null;
                    }
                }
                out.push(entry);
            }
            Role::ToolResults => {
                out.extend(message.tool_results.iter().map(|result| {
                    json!({
                        "role": "tool",
                        "tool_call_id": result.tool_call_id,
                        "content": result.content,
                    })
                }));
            }
        }
    }
    out
}

fn user_content(message: &FormattedMessage) -> Value {
    if message.media.is_empty() {
        return json!(message.text);
    }
    let mut parts = Vec::with_capacity(message.media.len() + 1);
    if !message.text.is_empty() {
        parts.push(json!({ "type": "text", "text": message.text }));
    }
    for part in &message.media {
        parts.push(json!({
            "type": "image_url",
            "image_url": { "url": format!("data:{};base64,{}", part.mime_type, part.base64) }
        }));
    }
    Value::Array(parts)
}

pub fn build_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "type": "function",
                "function": {
                    "name": tool.namespaced_name(),
                    "description": tool.description,
                    "parameters": tool.input_schema,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ModelCapabilities;
    use crate::formatting::MediaPart;
    use crate::types::{AttachmentKind, GenerationConfig, ToolCallRecord, ToolResultRecord};

    fn formatted(role: Role, text: &str) -> FormattedMessage {
        FormattedMessage {
            role,
            text: text.into(),
            media: vec![],
            tool_calls: vec![],
            tool_results: vec![],
        }
    }

    fn request(model: &str, messages: Vec<FormattedMessage>) -> AdapterRequest {
        AdapterRequest {
            request_id: "req".into(),
            config: GenerationConfig::new(model).unwrap(),
            messages,
            api_key: None,
            capabilities: ModelCapabilities::default(),
            base_url: String::new(),
        }
    }

    #[test]
    fn effort_is_sent_only_when_set() {
        let mut req = request("openai::o3-mini", vec![formatted(Role::User, "hi")]);
        let (body, param) = build_chat_body(OpenAiFlavor::OpenAi, &req, RequestOptions::default());
        assert!(body.get("reasoning_effort").is_none());
        assert!(param.is_none());

        req.config = req.config.clone().with_reasoning_effort(ReasoningEffort::High);
        let (body, param) = build_chat_body(OpenAiFlavor::OpenAi, &req, RequestOptions::default());
        assert_eq!(body["reasoning_effort"], "high");
        assert_eq!(param.map(|p| p.name), Some("reasoning_effort"));

        let (body, param) = build_chat_body(
            OpenAiFlavor::OpenAi,
            &req,
            RequestOptions {
                reasoning_params: false,
            },
        );
        assert!(body.get("reasoning_effort").is_none());
        assert!(param.is_none());
    }

    #[test]
    fn grok_effort_collapses_to_low_or_high() {
        let mut req = request("grok::grok-3-mini", vec![]);
        req.config = req.config.clone().with_reasoning_effort(ReasoningEffort::Medium);
        let (body, _) = build_chat_body(OpenAiFlavor::Grok, &req, RequestOptions::default());
        assert_eq!(body["reasoning_effort"], "low");
    }

    #[test]
    fn openrouter_reasoning_follows_visibility() {
        let mut req = request("openrouter::qwen/qwen3-32b", vec![]);
        let (body, _) = build_chat_body(OpenAiFlavor::OpenRouter, &req, RequestOptions::default());
        assert_eq!(body["reasoning"], json!({ "enabled": false }));

        req.config = req.config.clone().with_show_thoughts(true);
        let (body, _) = build_chat_body(OpenAiFlavor::OpenRouter, &req, RequestOptions::default());
        assert_eq!(body["reasoning"], json!({ "effort": "medium", "exclude": false }));

        req.config = req.config.clone().with_show_thoughts(false);
        req.capabilities.can_disable_reasoning = false;
        let (body, _) = build_chat_body(OpenAiFlavor::OpenRouter, &req, RequestOptions::default());
        assert_eq!(body["reasoning"]["exclude"], true);
    }

    #[test]
    fn tool_exchanges_are_replayed() {
        let mut assistant = formatted(Role::Assistant, "");
        assistant.tool_calls.push(ToolCallRecord {
            id: "call_1".into(),
            namespaced_name: "files__read".into(),
            arguments: json!({"path": "a.txt"}),
        });
        let mut results = formatted(Role::ToolResults, "");
        results.tool_results.push(ToolResultRecord {
            tool_call_id: "call_1".into(),
            namespaced_name: "files__read".into(),
            content: "hello".into(),
        });
        let messages = build_messages(Some("be brief"), &[assistant, results]);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["content"], Value::Null);
        assert_eq!(
            messages[1]["tool_calls"][0]["function"]["arguments"],
            r#"{"path":"a.txt"}"#
        );
        assert_eq!(messages[2]["role"], "tool");
        assert_eq!(messages[2]["tool_call_id"], "call_1");
    }

    #[test]
    fn images_become_data_urls() {
        let mut user = formatted(Role::User, "what is this");
        user.media.push(MediaPart {
            kind: AttachmentKind::Image,
            name: "cat.png".into(),
            mime_type: "image/png".into(),
            base64: "AAAA".into(),
        });
        let messages = build_messages(None, &[user]);
        let parts = messages[0]["content"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "what is this");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }
}
