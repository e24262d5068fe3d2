//! Ollama NDJSON fixtures tests

use unistream::providers::ollama::OllamaStreamDecoder;
use unistream::streaming::{CollectedOutcome, LifecycleState, ReasoningMode};

#[path = "../support/stream_fixture.rs"]
mod support;

#[tokio::test]
async fn ollama_think_and_answer_fixture() {
    let lines =
        support::load_lines("tests/fixtures/ollama/think_and_answer.ndjson").expect("load fixture");
    assert_eq!(lines.len(), 4);
    let (callbacks, state) = support::run_payloads(
        Box::new(OllamaStreamDecoder::new()),
        ReasoningMode::Visible,
        vec![],
        lines,
    )
    .await;

    assert_eq!(state, LifecycleState::Completed);
    let expected = format!("<think>Two plus two is four.{}4", support::close_marker());
    assert_eq!(callbacks.transcript(), expected);
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Completed {
            final_text: Some(expected),
            tool_calls: None,
        })
    );
}

#[tokio::test]
async fn ollama_redacted_mode_replaces_reasoning() {
    let lines =
        support::load_lines("tests/fixtures/ollama/think_and_answer.ndjson").expect("load fixture");
    let (callbacks, _) = support::run_payloads(
        Box::new(OllamaStreamDecoder::new()),
        ReasoningMode::Redacted,
        vec![],
        lines,
    )
    .await;

    let transcript = callbacks.transcript();
    assert!(transcript.starts_with("<think>"));
    assert!(!transcript.contains("Two plus two"));
    assert!(transcript.ends_with(&format!("{}4", support::close_marker())));
}
