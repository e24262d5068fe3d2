//! OpenAI-compatible streaming fixtures tests

use serde_json::json;
use unistream::providers::openai::OpenAiStreamDecoder;
use unistream::streaming::{CollectedOutcome, LifecycleState, ReasoningMode};
use unistream::types::ToolDefinition;

#[path = "../support/stream_fixture.rs"]
mod support;

async fn run_fixture(
    path: &str,
    mode: ReasoningMode,
    tools: Vec<ToolDefinition>,
) -> (unistream::streaming::CollectingCallbacks, LifecycleState) {
    let payloads = support::load_sse_payloads(path).expect("load fixture");
    support::run_payloads(Box::new(OpenAiStreamDecoder::new()), mode, tools, payloads).await
}

#[tokio::test]
async fn reasoning_field_is_wrapped_before_the_answer() {
    let (callbacks, state) = run_fixture(
        "tests/fixtures/openai/reasoning_then_answer.sse",
        ReasoningMode::Visible,
        vec![],
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    let expected = format!(
        "<think>The user wants a greeting.{}Hello there!",
        support::close_marker()
    );
    assert_eq!(callbacks.transcript(), expected);
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Completed {
            final_text: Some(expected),
            tool_calls: None,
        })
    );
    assert_eq!(callbacks.terminal_calls, 1);
}

#[tokio::test]
async fn hidden_reasoning_leaves_only_the_answer() {
    let (callbacks, state) = run_fixture(
        "tests/fixtures/openai/reasoning_then_answer.sse",
        ReasoningMode::Hidden,
        vec![],
    )
    .await;
    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(callbacks.transcript(), "Hello there!");
}

#[tokio::test]
async fn tool_call_fragments_are_assembled() {
    let tools = vec![ToolDefinition::new(
        "files",
        "read",
        "Read a file",
        json!({"type": "object", "properties": {"path": {"type": "string"}}}),
    )];
    let (callbacks, state) = run_fixture(
        "tests/fixtures/openai/tool_call_fragments.sse",
        ReasoningMode::Visible,
        tools,
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    assert!(callbacks.chunks.is_empty());
    let Some(CollectedOutcome::Completed {
        final_text,
        tool_calls: Some(calls),
    }) = callbacks.outcome
    else {
        panic!("expected completion with tool calls");
    };
    assert_eq!(final_text, None);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_abc");
    assert_eq!(calls[0].toolset, "files");
    assert_eq!(calls[0].tool_name, "read");
    assert_eq!(calls[0].arguments, Some(json!({"path": "src/lib.rs"})));
    assert_eq!(calls[0].description.as_deref(), Some("Read a file"));
}

#[tokio::test]
async fn error_payload_ends_the_stream_verbatim() {
    let (callbacks, state) = run_fixture(
        "tests/fixtures/openai/error_mid_stream.sse",
        ReasoningMode::Visible,
        vec![],
    )
    .await;

    assert_eq!(state, LifecycleState::Errored);
    // The malformed payload is skipped; nothing after the error is shown.
    assert_eq!(callbacks.transcript(), "Partial");
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Errored("Provider returned error".to_string()))
    );
    assert_eq!(callbacks.terminal_calls, 1);
}

#[tokio::test]
async fn inline_tags_split_across_payloads() {
    let (callbacks, state) = run_fixture(
        "tests/fixtures/openai/inline_think_tags.sse",
        ReasoningMode::Visible,
        vec![],
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(
        callbacks.transcript(),
        format!("<think>Check the units.{}42 meters", support::close_marker())
    );
}
