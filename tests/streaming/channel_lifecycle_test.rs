//! Lifecycle tests over the notify channel (claude-code backend)

use std::sync::{Arc, Mutex};
use std::time::Duration;

use unistream::credentials::StaticCredentials;
use unistream::engine::StreamEngine;
use unistream::error::LlmError;
use unistream::streaming::{
    CancelHandle, ChannelEvent, ChannelHub, CollectedOutcome, CollectingCallbacks, LifecycleState,
};
use unistream::types::{GenerationConfig, Message};
use unistream::EngineConfig;

/// A hub whose producer replays `script` as soon as it is started, plus the
/// request id and payload it was started with.
struct Harness {
    hub: ChannelHub,
    started: Arc<Mutex<Option<(String, serde_json::Value)>>>,
}

impl Harness {
    fn new(script: Vec<ChannelEvent>) -> Self {
        let hub = ChannelHub::new();
        let publisher = hub.clone();
        let started = Arc::new(Mutex::new(None));
        let record = started.clone();
        let hub = hub.with_start_handler(move |request_id, payload| {
            for event in &script {
                publisher.publish(&request_id, event.clone());
            }
            *record.lock().unwrap() = Some((request_id, payload));
            Ok(())
        });
        Self { hub, started }
    }

    fn failing(error: LlmError) -> Self {
        let hub = ChannelHub::new().with_start_handler(move |_, _| Err(error.clone()));
        Self {
            hub,
            started: Arc::new(Mutex::new(None)),
        }
    }

    fn engine(&self, config: EngineConfig) -> StreamEngine {
        StreamEngine::builder()
            .config(config)
            .http_client(reqwest::Client::new())
            .credentials(StaticCredentials::new())
            .channel(Arc::new(self.hub.clone()))
            .build()
            .unwrap()
    }

    fn request_id(&self) -> String {
        self.started.lock().unwrap().as_ref().unwrap().0.clone()
    }
}

fn assistant_text(id: &str, text: &str) -> ChannelEvent {
    ChannelEvent::data(
        serde_json::json!({
            "type": "assistant",
            "message": {"id": id, "content": [{"type": "text", "text": text}]}
        })
        .to_string(),
    )
}

fn config() -> GenerationConfig {
    GenerationConfig::new("claude-code::sonnet").unwrap()
}

#[tokio::test]
async fn start_payload_and_clean_exit() {
    let harness = Harness::new(vec![
        assistant_text("m1", "Hi"),
        assistant_text("m1", "Hi there"),
        ChannelEvent::done(Some(0)),
    ]);
    let engine = harness.engine(EngineConfig::default());
    let config = config().with_show_thoughts(true);
    let collected = engine
        .collect(&[Message::user("hello")], &config)
        .await;

    assert_eq!(collected.chunks, vec!["Hi", " there"]);
    assert_eq!(
        collected.outcome,
        Some(CollectedOutcome::Completed {
            final_text: Some("Hi there".into()),
            tool_calls: None,
        })
    );
    let (request_id, payload) = harness.started.lock().unwrap().clone().unwrap();
    assert_eq!(payload["requestId"], request_id.as_str());
    assert_eq!(payload["model"], "sonnet");
    assert_eq!(payload["prompt"], "User: hello");
    assert_eq!(payload["thinking"], true);
    // Released on completion; late events are discarded.
    assert_eq!(harness.hub.subscriber_count(), 0);
    assert!(!harness.hub.publish(&request_id, ChannelEvent::data("late")));
}

#[tokio::test(start_paused = true)]
async fn thinking_in_later_turns_is_shown() {
    let turn = |id: &str, content: serde_json::Value| {
        ChannelEvent::data(
            serde_json::json!({"type": "assistant", "message": {"id": id, "content": content}})
                .to_string(),
        )
    };
    let harness = Harness::new(vec![
        turn(
            "m1",
            serde_json::json!([
                {"type": "thinking", "thinking": "first thought"},
                {"type": "tool_use", "id": "t1", "name": "Read", "input": {"p": "a"}}
            ]),
        ),
        turn(
            "m2",
            serde_json::json!([
                {"type": "thinking", "thinking": "second thought"},
                {"type": "text", "text": "Final answer"}
            ]),
        ),
        ChannelEvent::done(Some(0)),
    ]);
    let config = config().with_show_thoughts(true);
    let collected = harness
        .engine(EngineConfig::default())
        .collect(&[Message::user("q")], &config)
        .await;

    let close = unistream::markers::think_close(1);
    let marker = unistream::markers::tool_call_marker("Read", &serde_json::json!({"p": "a"}));
    assert_eq!(
        collected.transcript(),
        format!("<think>first thought{close}{marker}<think>second thought{close}Final answer")
    );
    assert_eq!(collected.terminal_calls, 1);
}

#[tokio::test]
async fn nonzero_exit_after_content_completes_when_lenient() {
    let script = vec![
        assistant_text("m1", "Partial answer"),
        ChannelEvent::stderr("warning: session file locked"),
        ChannelEvent::done(Some(1)),
    ];

    let lenient = Harness::new(script.clone());
    let collected = lenient
        .engine(EngineConfig::default())
        .collect(&[Message::user("q")], &config())
        .await;
    assert!(matches!(
        collected.outcome,
        Some(CollectedOutcome::Completed { final_text: Some(ref text), .. }) if text == "Partial answer"
    ));

    let strict = Harness::new(script);
    let collected = strict
        .engine(EngineConfig::default().with_complete_on_exit_with_content(false))
        .collect(&[Message::user("q")], &config())
        .await;
    assert_eq!(
        collected.outcome,
        Some(CollectedOutcome::Errored(
            "warning: session file locked".to_string()
        ))
    );
    assert_eq!(collected.terminal_calls, 1);
}

#[tokio::test]
async fn nonzero_exit_without_content_reports_diagnostics() {
    let harness = Harness::new(vec![
        ChannelEvent::stderr("error: "),
        ChannelEvent::stderr("not logged in\n"),
        ChannelEvent::done(Some(2)),
    ]);
    let collected = harness
        .engine(EngineConfig::default())
        .collect(&[Message::user("q")], &config())
        .await;
    assert_eq!(
        collected.outcome,
        Some(CollectedOutcome::Errored("error: not logged in".to_string()))
    );

    let silent = Harness::new(vec![ChannelEvent::done(Some(3))]);
    let collected = silent
        .engine(EngineConfig::default())
        .collect(&[Message::user("q")], &config())
        .await;
    assert_eq!(
        collected.outcome,
        Some(CollectedOutcome::Errored(
            "Process exited with code 3 without producing a response".to_string()
        ))
    );
}

#[tokio::test]
async fn error_event_is_shown_verbatim() {
    let harness = Harness::new(vec![
        assistant_text("m1", "Working"),
        ChannelEvent::error("Claude Code process crashed"),
        assistant_text("m1", "Working on it"),
        ChannelEvent::done(Some(0)),
    ]);
    let mut callbacks = CollectingCallbacks::new();
    let state = harness
        .engine(EngineConfig::default())
        .stream_response(&[Message::user("q")], &config(), &mut callbacks)
        .await;

    assert_eq!(state, LifecycleState::Errored);
    assert_eq!(callbacks.transcript(), "Working");
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Errored("Claude Code process crashed".into()))
    );
    assert_eq!(callbacks.terminal_calls, 1);
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test]
async fn failed_start_releases_the_subscription() {
    let harness = Harness::failing(LlmError::ConfigurationError(
        "Claude Code CLI not found".into(),
    ));
    let collected = harness
        .engine(EngineConfig::default())
        .collect(&[Message::user("q")], &config())
        .await;

    assert_eq!(
        collected.outcome,
        Some(CollectedOutcome::Errored("Claude Code CLI not found".into()))
    );
    assert_eq!(harness.hub.subscriber_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn silent_producer_times_out() {
    let harness = Harness::new(vec![]);
    let engine = harness.engine(EngineConfig::default().with_timeout(Duration::from_secs(30)));
    let mut callbacks = CollectingCallbacks::new();
    let state = engine
        .stream_response(&[Message::user("q")], &config(), &mut callbacks)
        .await;

    assert_eq!(state, LifecycleState::TimedOut);
    assert_eq!(
        callbacks.outcome,
        Some(CollectedOutcome::Errored(
            "Request timed out after 30 seconds without a response from claude-code".into()
        ))
    );
    assert_eq!(harness.hub.subscriber_count(), 0);
    assert!(!harness
        .hub
        .publish(&harness.request_id(), ChannelEvent::done(Some(0))));
}

#[tokio::test(start_paused = true)]
async fn cancellation_fires_no_callbacks() {
    let harness = Harness::new(vec![assistant_text("m1", "Thinking out loud")]);
    let engine = harness.engine(EngineConfig::default());
    let cancel = CancelHandle::new();
    let mut callbacks = CollectingCallbacks::new();

    let config = config();
    let conversation = [Message::user("q")];
    let request =
        engine.stream_response_with_cancel(&conversation, &config, &mut callbacks, &cancel);
    let canceller = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    };
    let (state, ()) = tokio::join!(request, canceller);

    assert_eq!(state, LifecycleState::Cancelled);
    assert_eq!(callbacks.transcript(), "Thinking out loud");
    assert_eq!(callbacks.outcome, None);
    assert_eq!(callbacks.terminal_calls, 0);
    assert_eq!(harness.hub.subscriber_count(), 0);
}
