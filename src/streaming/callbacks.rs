//! Output surface of a request.

use crate::types::ToolCallResult;

/// Receives the normalized output of one request.
///
/// `on_chunk` fires zero or more times, then exactly one of `on_complete` or
/// `on_error`. A cancelled request fires neither terminal callback.
pub trait StreamCallbacks: Send {
    fn on_chunk(&mut self, text: &str);

    /// `final_text` is the whole transcript sent through `on_chunk`, if any.
    fn on_complete(&mut self, final_text: Option<String>, tool_calls: Option<Vec<ToolCallResult>>);

    fn on_error(&mut self, message: String);
}

/// Outcome of a finished request as seen by `CollectingCallbacks`.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectedOutcome {
    Completed {
        final_text: Option<String>,
        tool_calls: Option<Vec<ToolCallResult>>,
    },
    Errored(String),
}

/// Callbacks that record everything, for embedders that want a batch result.
#[derive(Debug, Default, Clone)]
pub struct CollectingCallbacks {
    pub chunks: Vec<String>,
    pub outcome: Option<CollectedOutcome>,
    /// Terminal callbacks received; more than one is a contract violation
    pub terminal_calls: usize,
}

impl CollectingCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> String {
        self.chunks.concat()
    }
}

impl StreamCallbacks for CollectingCallbacks {
    fn on_chunk(&mut self, text: &str) {
        self.chunks.push(text.to_string());
    }

    fn on_complete(&mut self, final_text: Option<String>, tool_calls: Option<Vec<ToolCallResult>>) {
        self.terminal_calls += 1;
        self.outcome = Some(CollectedOutcome::Completed {
            final_text,
            tool_calls,
        });
    }

    fn on_error(&mut self, message: String) {
        self.terminal_calls += 1;
        self.outcome = Some(CollectedOutcome::Errored(message));
    }
}
