//! Stream driver
//!
//! Runs one request's raw events through the wire decoder, the reasoning
//! classifier and the tool call accumulator, and resolves the lifecycle.
//! All work happens synchronously per event, so `on_chunk` order is exactly
//! raw event arrival order.

use std::time::Instant;

use futures::StreamExt;
use tokio::time::Instant as TokioInstant;

use super::callbacks::StreamCallbacks;
use super::cancel::{wait_cancelled, CancelHandle};
use super::events::{DecodedEvent, RawEvent, RawEventStream, WireDecoder};
use super::lifecycle::{LifecycleState, RequestLifecycle};
use super::reasoning::{ReasoningClassifier, ReasoningMode};
use super::tool_calls::ToolCallAccumulator;
use crate::config::EngineConfig;
use crate::error::LlmError;
use crate::types::{RawDelta, ToolDefinition};

/// Per-request processing state, consumed by `run`.
pub struct StreamSession {
    backend: String,
    decoder: Box<dyn WireDecoder>,
    classifier: ReasoningClassifier,
    accumulator: ToolCallAccumulator,
    tools: Vec<ToolDefinition>,
    timeout: std::time::Duration,
    complete_on_exit_with_content: bool,
}

enum Step {
    Event(RawEvent),
    TimedOut,
    Cancelled,
}

impl StreamSession {
    pub fn new(
        backend: impl Into<String>,
        decoder: Box<dyn WireDecoder>,
        mode: ReasoningMode,
        tools: Vec<ToolDefinition>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            backend: backend.into(),
            decoder,
            classifier: ReasoningClassifier::new(mode, config),
            accumulator: ToolCallAccumulator::new(),
            tools,
            timeout: config.timeout,
            complete_on_exit_with_content: config.complete_on_exit_with_content,
        }
    }

    /// Drive `source` to a terminal state with a fresh timeout ceiling.
    pub async fn run(
        self,
        source: RawEventStream,
        callbacks: &mut dyn StreamCallbacks,
        cancel: Option<&CancelHandle>,
    ) -> LifecycleState {
        let deadline = TokioInstant::now() + self.timeout;
        let lenient = self.complete_on_exit_with_content;
        let backend = self.backend.clone();
        let mut lifecycle = RequestLifecycle::new(backend, callbacks, lenient);
        lifecycle.attach(source);
        self.run_until(&mut lifecycle, deadline, cancel).await
    }

    /// Drive an already attached lifecycle until `deadline`.
    pub async fn run_until(
        mut self,
        lifecycle: &mut RequestLifecycle<'_>,
        deadline: TokioInstant,
        cancel: Option<&CancelHandle>,
    ) -> LifecycleState {
        while !lifecycle.is_terminal() {
            let step = {
                let Some(subscription) = lifecycle.subscription_mut() else {
                    break;
                };
                tokio::select! {
                    biased;
                    _ = wait_cancelled(cancel) => Step::Cancelled,
                    next = tokio::time::timeout_at(deadline, subscription.next()) => match next {
                        Ok(Some(event)) => Step::Event(event),
                        // An exhausted source is a clean end.
                        Ok(None) => Step::Event(RawEvent::Done { exit_code: Some(0) }),
                        Err(_) => Step::TimedOut,
                    },
                }
            };

            match step {
                Step::Event(event) => self.handle_raw(lifecycle, event),
                Step::TimedOut => {
                    lifecycle.fail(LlmError::TimeoutError(format!(
                        "Request timed out after {} seconds without a response from {}",
                        self.timeout.as_secs(),
                        self.backend
                    )));
                }
                Step::Cancelled => lifecycle.cancel(),
            }
        }
        lifecycle.state()
    }

    fn handle_raw(&mut self, lifecycle: &mut RequestLifecycle<'_>, event: RawEvent) {
        match event {
            RawEvent::Data(payload) => {
                tracing::trace!(backend = %self.backend, payload = %payload, "Raw payload");
                for decoded in self.decoder.convert_payload(&payload) {
                    if lifecycle.is_terminal() {
                        break;
                    }
                    match decoded {
                        Ok(event) => self.handle_decoded(lifecycle, event),
                        Err(error) => {
                            tracing::warn!(
                                backend = %self.backend,
                                error = %error,
                                "Skipping malformed payload"
                            );
                        }
                    }
                }
            }
            RawEvent::Error(message) => lifecycle.fail(LlmError::UpstreamError(message)),
            RawEvent::Stderr(text) => lifecycle.push_diagnostics(&text),
            RawEvent::Done { exit_code } => {
                for event in self.decoder.handle_stream_end() {
                    match event {
                        DecodedEvent::MessageStart => self.start_message(lifecycle),
                        DecodedEvent::Delta(delta) => self.apply_delta(lifecycle, delta),
                        DecodedEvent::UpstreamError(message) => {
                            lifecycle.fail(LlmError::UpstreamError(message))
                        }
                        DecodedEvent::End => {}
                    }
                }
                if lifecycle.is_terminal() {
                    return;
                }
                self.flush(lifecycle);
                let tool_calls = std::mem::take(&mut self.accumulator).finalize(&self.tools);
                lifecycle.on_exit(exit_code.unwrap_or(0), tool_calls);
            }
        }
    }

    fn handle_decoded(&mut self, lifecycle: &mut RequestLifecycle<'_>, event: DecodedEvent) {
        match event {
            DecodedEvent::MessageStart => self.start_message(lifecycle),
            DecodedEvent::Delta(delta) => self.apply_delta(lifecycle, delta),
            DecodedEvent::UpstreamError(message) => {
                lifecycle.fail(LlmError::UpstreamError(message))
            }
            DecodedEvent::End => {
                self.flush(lifecycle);
                let tool_calls = std::mem::take(&mut self.accumulator).finalize(&self.tools);
                lifecycle.complete(tool_calls);
            }
        }
    }

    fn start_message(&mut self, lifecycle: &mut RequestLifecycle<'_>) {
        for chunk in self.classifier.on_message_start(now()) {
            lifecycle.emit(&chunk);
        }
    }

    /// Reasoning first, then content, then tool fragments.
    fn apply_delta(&mut self, lifecycle: &mut RequestLifecycle<'_>, delta: RawDelta) {
        let now = now();
        if let Some(reasoning) = delta.reasoning.as_deref() {
            for chunk in self.classifier.on_reasoning(reasoning, now) {
                lifecycle.emit(&chunk);
            }
        }
        if let Some(content) = delta.content.as_deref() {
            for chunk in self.classifier.on_content(content, now) {
                lifecycle.emit(&chunk);
            }
        }
        if !delta.tool_calls.is_empty() {
            for chunk in self.classifier.on_tool_call(now) {
                lifecycle.emit(&chunk);
            }
            for fragment in delta.tool_calls {
                self.accumulator.push(fragment);
            }
        }
        if self.classifier.content_seen() || !self.accumulator.is_empty() {
            lifecycle.mark_content();
        }
    }

    fn flush(&mut self, lifecycle: &mut RequestLifecycle<'_>) {
        for chunk in self.classifier.finish(now()) {
            lifecycle.emit(&chunk);
        }
        if self.classifier.content_seen() || !self.accumulator.is_empty() {
            lifecycle.mark_content();
        }
    }
}

/// Wall clock that follows tokio's paused time in tests.
fn now() -> Instant {
    TokioInstant::now().into_std()
}
