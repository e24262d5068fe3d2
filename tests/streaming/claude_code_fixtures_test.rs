//! Claude Code message fixtures tests

use unistream::markers::{parse_tool_call_markers, tool_call_marker};
use unistream::providers::claude_code::ClaudeCodeStreamDecoder;
use unistream::streaming::{CollectedOutcome, LifecycleState, ReasoningMode};

#[path = "../support/stream_fixture.rs"]
mod support;

const FIXTURE: &str = "tests/fixtures/claude_code/tool_use_session.jsonl";

fn expected_transcript() -> String {
    format!(
        "<think>Need the manifest.{}{}The crate is called unistream.",
        support::close_marker(),
        tool_call_marker("Read", &serde_json::json!({"file_path": "Cargo.toml"}))
    )
}

#[tokio::test]
async fn cumulative_messages_stream_once() {
    let lines = support::load_lines(FIXTURE).expect("load fixture");
    let (callbacks, state) = support::run_payloads(
        Box::new(ClaudeCodeStreamDecoder::new()),
        ReasoningMode::Visible,
        vec![],
        lines,
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(callbacks.transcript(), expected_transcript());

    // Tool use travels as a marker, not as a structured call.
    let markers = parse_tool_call_markers(&callbacks.transcript());
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].name, "Read");
    assert!(matches!(
        callbacks.outcome,
        Some(CollectedOutcome::Completed { tool_calls: None, .. })
    ));
}

#[tokio::test]
async fn one_payload_with_many_lines_matches_line_by_line() {
    let body = support::load_body(FIXTURE);
    let (callbacks, state) = support::run_payloads(
        Box::new(ClaudeCodeStreamDecoder::new()),
        ReasoningMode::Visible,
        vec![],
        vec![body],
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(callbacks.transcript(), expected_transcript());
}

#[tokio::test]
async fn every_assistant_turn_gets_its_own_span() {
    let lines = support::load_lines("tests/fixtures/claude_code/multi_turn_thinking.jsonl")
        .expect("load fixture");
    let (callbacks, state) = support::run_payloads(
        Box::new(ClaudeCodeStreamDecoder::new()),
        ReasoningMode::Visible,
        vec![],
        lines,
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(
        callbacks.transcript(),
        format!(
            "<think>first thought{close}{marker}<think>second thought{close}Final answer",
            close = support::close_marker(),
            marker = tool_call_marker("Read", &serde_json::json!({"p": "a"})),
        )
    );
}
