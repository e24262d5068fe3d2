//! Completion lifecycle controller
//!
//! One `RequestLifecycle` per request. It owns the raw subscription and the
//! caller's callbacks, and guarantees:
//!
//! - no callback fires after a terminal state is reached;
//! - exactly one of `on_complete` / `on_error` fires (none when cancelled);
//! - the subscription is released exactly once, on every terminal path.

use crate::error::LlmError;
use crate::types::ToolCallResult;

use super::callbacks::StreamCallbacks;
use super::events::RawEventStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Completed,
    Errored,
    TimedOut,
    /// The caller released the request; no terminal callback fired.
    Cancelled,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

pub struct RequestLifecycle<'a> {
    backend: String,
    state: LifecycleState,
    subscription: Option<RawEventStream>,
    callbacks: &'a mut dyn StreamCallbacks,
    content_seen: bool,
    diagnostics: String,
    transcript: String,
    complete_on_exit_with_content: bool,
}

impl<'a> RequestLifecycle<'a> {
    pub fn new(
        backend: impl Into<String>,
        callbacks: &'a mut dyn StreamCallbacks,
        complete_on_exit_with_content: bool,
    ) -> Self {
        Self {
            backend: backend.into(),
            state: LifecycleState::Running,
            subscription: None,
            callbacks,
            content_seen: false,
            diagnostics: String::new(),
            transcript: String::new(),
            complete_on_exit_with_content,
        }
    }

    /// Take ownership of the raw event source.
    pub fn attach(&mut self, subscription: RawEventStream) {
        if self.state.is_terminal() {
            // Already resolved: release immediately.
            drop(subscription);
            return;
        }
        self.subscription = Some(subscription);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn content_seen(&self) -> bool {
        self.content_seen
    }

    pub fn diagnostics(&self) -> &str {
        &self.diagnostics
    }

    pub(crate) fn subscription_mut(&mut self) -> Option<&mut RawEventStream> {
        if self.state.is_terminal() {
            return None;
        }
        self.subscription.as_mut()
    }

    /// Forward a normalized chunk to the caller.
    pub fn emit(&mut self, chunk: &str) {
        if self.state.is_terminal() || chunk.is_empty() {
            return;
        }
        self.transcript.push_str(chunk);
        self.callbacks.on_chunk(chunk);
    }

    pub fn mark_content(&mut self) {
        self.content_seen = true;
    }

    pub fn push_diagnostics(&mut self, text: &str) {
        if self.state.is_terminal() {
            return;
        }
        self.diagnostics.push_str(text);
    }

    pub fn complete(&mut self, tool_calls: Vec<ToolCallResult>) {
        if !self.transition(LifecycleState::Completed) {
            return;
        }
        let final_text = (!self.transcript.is_empty()).then(|| std::mem::take(&mut self.transcript));
        let tool_calls = (!tool_calls.is_empty()).then_some(tool_calls);
        tracing::info!(
            backend = %self.backend,
            tool_calls = tool_calls.as_ref().map_or(0, Vec::len),
            "Stream completed"
        );
        self.callbacks.on_complete(final_text, tool_calls);
    }

    pub fn fail(&mut self, error: LlmError) {
        let next = match &error {
            LlmError::TimeoutError(_) => LifecycleState::TimedOut,
            _ => LifecycleState::Errored,
        };
        if !self.transition(next) {
            tracing::debug!(error = %error, "Ignoring error after terminal state");
            return;
        }
        tracing::info!(backend = %self.backend, error = %error, "Stream failed");
        self.callbacks.on_error(error.user_message());
    }

    pub fn cancel(&mut self) {
        if self.transition(LifecycleState::Cancelled) {
            tracing::info!(backend = %self.backend, "Stream cancelled");
        }
    }

    /// Resolve a logical end of stream carrying an exit status.
    pub fn on_exit(&mut self, exit_code: i32, tool_calls: Vec<ToolCallResult>) {
        if exit_code == 0 {
            self.complete(tool_calls);
            return;
        }
        let diagnostics = self.diagnostics.trim().to_string();
        if self.content_seen && self.complete_on_exit_with_content {
            tracing::warn!(
                backend = %self.backend,
                exit_code,
                diagnostics = %diagnostics,
                "Non-zero exit after content was produced; completing with partial output"
            );
            self.complete(tool_calls);
            return;
        }
        self.fail(LlmError::ExitFailure {
            code: exit_code,
            diagnostics: (!diagnostics.is_empty()).then_some(diagnostics),
        });
    }

    /// Move to a terminal state once, releasing the subscription.
    fn transition(&mut self, next: LifecycleState) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = next;
        self.release();
        true
    }

    fn release(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            drop(subscription);
            tracing::debug!(backend = %self.backend, "Raw event source released");
        }
    }
}
