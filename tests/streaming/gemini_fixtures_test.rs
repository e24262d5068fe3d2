//! Gemini streaming fixtures tests

use serde_json::json;
use unistream::providers::gemini::GeminiStreamDecoder;
use unistream::streaming::{CollectedOutcome, LifecycleState, ReasoningMode};

#[path = "../support/stream_fixture.rs"]
mod support;

#[tokio::test]
async fn gemini_thought_text_and_function_call_fixture() {
    let payloads =
        support::load_sse_payloads("tests/fixtures/gemini/thought_and_function_call.sse")
            .expect("load fixture");
    let (callbacks, state) = support::run_payloads(
        Box::new(GeminiStreamDecoder::new()),
        ReasoningMode::Visible,
        vec![],
        payloads,
    )
    .await;

    // Gemini has no explicit end event; the end of the body completes.
    assert_eq!(state, LifecycleState::Completed);
    assert_eq!(
        callbacks.transcript(),
        format!(
            "<think>Looking up the weather API.{}Let me check.",
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
    assert_eq!(calls[0].namespaced_name, "weather__current");
    assert_eq!(calls[0].toolset, "weather");
    assert_eq!(calls[0].arguments, Some(json!({"city": "Paris"})));
    // No id on the wire: one is generated.
    assert!(calls[0].id.starts_with("call_"));
    // Unknown tool: no metadata.
    assert_eq!(calls[0].description, None);
}

#[tokio::test]
async fn gemini_hidden_thoughts_are_dropped() {
    let payloads =
        support::load_sse_payloads("tests/fixtures/gemini/thought_and_function_call.sse")
            .expect("load fixture");
    let (callbacks, _) = support::run_payloads(
        Box::new(GeminiStreamDecoder::new()),
        ReasoningMode::Hidden,
        vec![],
        payloads,
    )
    .await;
    assert_eq!(callbacks.transcript(), "Let me check.");
}
