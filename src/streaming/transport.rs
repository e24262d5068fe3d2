//! HTTP transports
//!
//! Turns a successful streaming response into a `RawEventStream`. SSE goes
//! through `eventsource-stream`, which handles UTF-8 boundaries and line
//! buffering; NDJSON goes through a `LinesCodec`. A clean end of body becomes
//! `Done { exit_code: Some(0) }`.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use futures_util::TryStreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

use super::events::{RawEvent, RawEventStream};

/// Server-sent events. Comment lines and empty data are skipped.
pub fn sse_events(response: reqwest::Response) -> RawEventStream {
    let mut events = Box::pin(response.bytes_stream().eventsource());
    let stream = async_stream::stream! {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if event.data.trim().is_empty() {
                        continue;
                    }
                    yield RawEvent::Data(event.data);
                }
                Err(e) => {
                    yield RawEvent::Error(format!("SSE stream error: {e}"));
                    return;
                }
            }
        }
        yield RawEvent::Done { exit_code: Some(0) };
    };
    Box::pin(stream)
}

/// Newline-delimited JSON. Each non-empty line is one payload.
pub fn ndjson_events(response: reqwest::Response) -> RawEventStream {
    let byte_stream = response
        .bytes_stream()
        .map_err(|e| std::io::Error::other(format!("Stream error: {e}")));
    let reader = StreamReader::new(byte_stream);
    let mut lines = Box::pin(FramedRead::new(reader, LinesCodec::new()));

    let stream = async_stream::stream! {
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    yield RawEvent::Data(trimmed.to_string());
                }
                Err(e) => {
                    yield RawEvent::Error(format!("NDJSON stream error: {e}"));
                    return;
                }
            }
        }
        yield RawEvent::Done { exit_code: Some(0) };
    };
    Box::pin(stream)
}

/// A raw stream over a fixed list of events.
pub fn raw_events(events: Vec<RawEvent>) -> RawEventStream {
    Box::pin(futures::stream::iter(events))
}
