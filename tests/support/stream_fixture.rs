//! Test fixture utilities: load recorded streams and drive them through a session
#![allow(dead_code)]

use std::io;

use unistream::config::EngineConfig;
use unistream::streaming::{
    raw_events, CollectingCallbacks, LifecycleState, RawEvent, ReasoningMode, StreamSession,
    WireDecoder,
};
use unistream::types::ToolDefinition;

/// Load an `.sse` fixture and return the data payload of every event.
///
/// Events are separated by blank lines; multi-line data is joined with `\n`
/// and comment-only events are skipped, as an SSE client would.
pub fn load_sse_payloads(path: &str) -> io::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    let normalized = raw.replace("\r\n", "\n");
    let mut out = Vec::new();
    for block in normalized.split("\n\n") {
        let data: Vec<&str> = block
            .lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            .collect();
        if data.is_empty() {
            continue;
        }
        out.push(data.join("\n"));
    }
    Ok(out)
}

/// Load a line-oriented fixture (`.ndjson`, `.jsonl`), skipping blank lines.
pub fn load_lines(path: &str) -> io::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Raw body of a fixture, for serving from a mock server.
pub fn load_body(path: &str) -> String {
    std::fs::read_to_string(path).expect("load fixture body")
}

/// Feed payloads through a fresh session, followed by a clean end of stream.
pub async fn run_payloads(
    decoder: Box<dyn WireDecoder>,
    mode: ReasoningMode,
    tools: Vec<ToolDefinition>,
    payloads: Vec<String>,
) -> (CollectingCallbacks, LifecycleState) {
    let mut events: Vec<RawEvent> = payloads.into_iter().map(RawEvent::Data).collect();
    events.push(RawEvent::Done { exit_code: Some(0) });

    let session = StreamSession::new("fixture", decoder, mode, tools, &EngineConfig::default());
    let mut callbacks = CollectingCallbacks::new();
    let state = session.run(raw_events(events), &mut callbacks, None).await;
    (callbacks, state)
}

/// The close marker for a span that lasted under a second.
pub fn close_marker() -> String {
    unistream::markers::think_close(1)
}
