//! Start payload for a Claude Code run

use serde_json::{json, Value};

use crate::formatting::flatten_transcript;
use crate::providers::{AdapterRequest, RequestOptions};

/// The payload handed to `NotifyChannel::start`.
///
/// The conversation is flattened into a single prompt; the producer owns
/// the session.
pub fn build_start_payload(request: &AdapterRequest, options: RequestOptions) -> Value {
    let mut payload = json!({
        "requestId": request.request_id,
        "model": request.model(),
        "prompt": flatten_transcript(&request.messages),
        "thinking": options.reasoning_params && request.show_thoughts(),
    });
    if let Some(system) = request
        .config
        .system_prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
    {
        payload["systemPrompt"] = json!(system);
    }
    if let Some(effort) = request.config.reasoning_effort {
        payload["effort"] = json!(effort.as_str());
    }
    if !request.config.tools.is_empty() {
        payload["allowedTools"] = request
            .config
            .tools
            .iter()
            .map(|tool| Value::String(tool.namespaced_name()))
            .collect();
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::ModelCapabilities;
    use crate::formatting::FormattedMessage;
    use crate::types::{GenerationConfig, Role};

    #[test]
    fn payload_flattens_the_conversation() {
        let request = AdapterRequest {
            request_id: "req-1".into(),
            config: GenerationConfig::new("claude-code::sonnet")
                .unwrap()
                .with_show_thoughts(true)
                .with_system_prompt("terse"),
            messages: vec![
                FormattedMessage {
                    role: Role::User,
                    text: "hi".into(),
                    media: vec![],
                    tool_calls: vec![],
                    tool_results: vec![],
                },
                FormattedMessage {
                    role: Role::Assistant,
                    text: "hello".into(),
                    media: vec![],
                    tool_calls: vec![],
                    tool_results: vec![],
                },
            ],
            api_key: None,
            capabilities: ModelCapabilities::default(),
            base_url: String::new(),
        };
        let payload = build_start_payload(&request, RequestOptions::default());
        assert_eq!(payload["requestId"], "req-1");
        assert_eq!(payload["model"], "sonnet");
        assert_eq!(payload["prompt"], "User: hi\n\nAssistant: hello");
        assert_eq!(payload["thinking"], true);
        assert_eq!(payload["systemPrompt"], "terse");

        let payload = build_start_payload(
            &request,
            RequestOptions {
                reasoning_params: false,
            },
        );
        assert_eq!(payload["thinking"], false);
    }
}
