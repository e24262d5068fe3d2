//! Anthropic streaming fixtures tests

use serde_json::json;
use unistream::providers::anthropic::AnthropicStreamDecoder;
use unistream::streaming::{CollectedOutcome, LifecycleState, ReasoningMode};
use unistream::types::ToolDefinition;

#[path = "../support/stream_fixture.rs"]
mod support;

fn decoder() -> Box<AnthropicStreamDecoder> {
    Box::new(AnthropicStreamDecoder::new("Reasoning is hidden."))
}

#[tokio::test]
async fn anthropic_thinking_text_and_tool_use_fixture() {
    let payloads =
        support::load_sse_payloads("tests/fixtures/anthropic/thinking_and_tool_use.sse")
            .expect("load fixture");
    let tools = vec![ToolDefinition::new(
        "files",
        "read",
        "Read a file",
        json!({"type": "object"}),
    )];
    let (callbacks, state) =
        support::run_payloads(decoder(), ReasoningMode::Visible, tools, payloads).await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(
        callbacks.transcript(),
        format!(
            "<think>I should read the file.{}Reading it now.",
            support::close_marker()
        )
    );
    let Some(CollectedOutcome::Completed {
        tool_calls: Some(calls),
        ..
    }) = callbacks.outcome
    else {
        panic!("expected completion with tool calls");
    };
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "toolu_01");
    assert_eq!(calls[0].namespaced_name, "files__read");
    assert_eq!(calls[0].arguments, Some(json!({"path": "README.md"})));
    assert_eq!(calls[0].parse_error, None);
}

#[tokio::test]
async fn anthropic_error_event_fixture() {
    let payloads = support::load_sse_payloads("tests/fixtures/anthropic/error_event.sse")
        .expect("load fixture");
    let (callbacks, state) =
        support::run_payloads(decoder(), ReasoningMode::Visible, vec![], payloads).await;

    assert_eq!(state, LifecycleState::Errored);
    assert!(callbacks.chunks.is_empty());
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Errored(
            "overloaded_error: Overloaded".to_string()
        ))
    );
}

#[tokio::test]
async fn redacted_thinking_shows_the_placeholder_once() {
    let payloads = vec![
        r#"{"type":"content_block_start","index":0,"content_block":{"type":"redacted_thinking","data":"EmwKAhgB"}}"#.to_string(),
        r#"{"type":"content_block_start","index":1,"content_block":{"type":"redacted_thinking","data":"EmwKAhgC"}}"#.to_string(),
        r#"{"type":"content_block_delta","index":2,"delta":{"type":"text_delta","text":"Done."}}"#.to_string(),
        r#"{"type":"message_stop"}"#.to_string(),
    ];
    let (callbacks, state) =
        support::run_payloads(decoder(), ReasoningMode::Visible, vec![], payloads).await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(
        callbacks.transcript(),
        format!("<think>Reasoning is hidden.{}Done.", support::close_marker())
    );
}
