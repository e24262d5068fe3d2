//! Reasoning stream classifier
//!
//! Decides, from a short prefix of the reasoning field, whether the backend
//! wraps its own reasoning in inline `<think>` tags, and emits exactly one
//! reasoning span per message followed by the answer text.
//!
//! ```text
//!   Unknown ──(tag seen in probe)──────────▶ Wrapped { native }
//!      │   ──(threshold reached, no tags)──▶ Wrapped { synthetic }
//!      └──(content arrives)──▶ Closed ◀──(closer / content)── Wrapped
//! ```
//!
//! The classifier is clock-agnostic: every call takes `now`, so span
//! durations are deterministic under test.

use std::time::Instant;

use crate::config::EngineConfig;
use crate::markers;

/// How reasoning fragments are surfaced for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningMode {
    /// Reasoning is wrapped in a span and shown verbatim.
    Visible,
    /// A single placeholder replaces the reasoning text.
    Redacted,
    /// Reasoning fragments are dropped and no span is emitted.
    Hidden,
}

impl ReasoningMode {
    pub fn resolve(show_thoughts: bool, redact: bool) -> Self {
        match (show_thoughts, redact) {
            (false, _) => Self::Hidden,
            (true, true) => Self::Redacted,
            (true, false) => Self::Visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Unknown,
    Wrapped,
    /// The span (if any) is closed; later reasoning in this message is ignored.
    Closed,
}

#[derive(Debug, Clone)]
pub struct ReasoningClassifier {
    mode: ReasoningMode,
    probe_window: usize,
    detect_threshold: usize,
    placeholder: String,

    phase: Phase,
    native: bool,
    /// A vendor closer was consumed; reasoning-field text is now answer text
    native_closed: bool,
    span_open: bool,
    started_at: Option<Instant>,
    /// Reasoning held while the mode is undecided
    buffer: String,
    probe: String,
    /// Trailing text that may still complete an inline tag
    pending: String,
    /// Every reasoning character surfaced so far, for the end-of-stream fallback
    reasoning_text: String,
    content_seen: bool,
    tool_activity: bool,
}

impl ReasoningClassifier {
    pub fn new(mode: ReasoningMode, config: &EngineConfig) -> Self {
        Self {
            mode,
            probe_window: config.probe_window,
            detect_threshold: config.detect_threshold,
            placeholder: config.redaction_placeholder.clone(),
            phase: Phase::Unknown,
            native: false,
            native_closed: false,
            span_open: false,
            started_at: None,
            buffer: String::new(),
            probe: String::new(),
            pending: String::new(),
            reasoning_text: String::new(),
            content_seen: false,
            tool_activity: false,
        }
    }

    /// Whether any answer text has been emitted.
    pub fn content_seen(&self) -> bool {
        self.content_seen
    }

    /// Whether the backend was observed emitting its own inline tags.
    pub fn native_tags_detected(&self) -> bool {
        self.native
    }

    /// Feed a reasoning-field fragment.
    ///
    /// Inline tags are detected in every mode, so answer text following a
    /// vendor closer is surfaced even when the reasoning itself is not.
    pub fn on_reasoning(&mut self, fragment: &str, now: Instant) -> Vec<String> {
        let mut out = Vec::new();
        if fragment.is_empty() {
            return out;
        }
        if self.native_closed {
            self.emit_content(fragment, &mut out);
            return out;
        }
        if self.phase == Phase::Closed {
            return out;
        }

        self.started_at.get_or_insert(now);
        if self.mode == ReasoningMode::Redacted {
            self.open_span(now, &mut out);
        }
        match self.phase {
            Phase::Unknown => self.probe_fragment(fragment, now, &mut out),
            Phase::Wrapped if self.native => {
                let text = std::mem::take(&mut self.pending) + fragment;
                self.process_native(&text, now, &mut out);
            }
            Phase::Wrapped => self.emit_reasoning(fragment.to_string(), &mut out),
            Phase::Closed => {}
        }
        out
    }

    /// A new assistant message began within the same request.
    ///
    /// Closes whatever the previous message left open and rearms detection,
    /// so the next message may carry its own span. Request-wide facts
    /// (answer seen, tool activity) are kept.
    pub fn on_message_start(&mut self, now: Instant) -> Vec<String> {
        let mut out = Vec::new();
        if self.phase != Phase::Closed {
            self.end_reasoning(now, &mut out);
        }
        self.phase = Phase::Unknown;
        self.native = false;
        self.native_closed = false;
        self.started_at = None;
        self.buffer.clear();
        self.probe.clear();
        self.pending.clear();
        out
    }

    /// Feed a content-field fragment. Content always ends an open span.
    pub fn on_content(&mut self, fragment: &str, now: Instant) -> Vec<String> {
        let mut out = Vec::new();
        if fragment.is_empty() {
            return out;
        }
        self.end_reasoning(now, &mut out);
        self.emit_content(fragment, &mut out);
        out
    }

    /// A tool call began: reasoning is over, but no answer text was produced.
    pub fn on_tool_call(&mut self, now: Instant) -> Vec<String> {
        let mut out = Vec::new();
        self.tool_activity = true;
        if self.phase != Phase::Closed {
            self.end_reasoning(now, &mut out);
        }
        out
    }

    /// Flush state at end of stream.
    pub fn finish(&mut self, now: Instant) -> Vec<String> {
        let mut out = Vec::new();
        let fallback = self.mode == ReasoningMode::Visible
            && !self.content_seen
            && !self.tool_activity
            && !self.native
            && (!self.buffer.is_empty() || !self.reasoning_text.is_empty());

        if fallback {
            // Undecided reasoning becomes the answer; a shown span is closed first.
            let text = if self.phase == Phase::Unknown {
                std::mem::take(&mut self.buffer)
            } else {
                self.close_span(now, &mut out);
                self.reasoning_text.clone()
            };
            self.phase = Phase::Closed;
            self.content_seen = true;
            push(&mut out, format!("\n\n{text}"));
            return out;
        }

        self.end_reasoning(now, &mut out);
        out
    }

    fn probe_fragment(&mut self, fragment: &str, now: Instant, out: &mut Vec<String>) {
        self.buffer.push_str(fragment);
        let probe = std::mem::take(&mut self.probe) + fragment;
        let detected = markers::contains_inline_tag(&probe);
        self.probe = tail_chars(&probe, self.probe_window).to_string();

        if detected {
            tracing::debug!("Inline reasoning tags detected");
            self.native = true;
            self.phase = Phase::Wrapped;
            let text = std::mem::take(&mut self.buffer);
            self.process_native(&text, now, out);
        } else if self.buffer.chars().count() >= self.detect_threshold {
            self.phase = Phase::Wrapped;
            self.open_span(now, out);
            let text = std::mem::take(&mut self.buffer);
            self.emit_reasoning(text, out);
        }
    }

    /// Strip vendor openers, split on the first closer and hold back a
    /// trailing partial tag until the next fragment arrives.
    fn process_native(&mut self, text: &str, now: Instant, out: &mut Vec<String>) {
        let stripped = markers::strip_inline_openers(text).into_owned();

        if let Some((start, end)) = markers::find_inline_closer(&stripped) {
            self.open_span(now, out);
            self.emit_reasoning(stripped[..start].to_string(), out);
            self.close_span(now, out);
            self.phase = Phase::Closed;
            self.native_closed = true;
            let answer = &stripped[end..];
            if !answer.is_empty() {
                self.emit_content(answer, out);
            }
            return;
        }

        let (ready, held) = match markers::partial_tag_start(&stripped) {
            Some(idx) => stripped.split_at(idx),
            None => (stripped.as_str(), ""),
        };
        self.pending = held.to_string();
        if !self.span_open && ready.trim().is_empty() {
            // Nothing but whitespace so far: wait before opening the span.
            self.pending = stripped.clone();
            return;
        }
        self.open_span(now, out);
        self.emit_reasoning(ready.to_string(), out);
    }

    /// Close out reasoning before answer text or at end of stream.
    fn end_reasoning(&mut self, now: Instant, out: &mut Vec<String>) {
        if self.phase == Phase::Unknown && !self.buffer.is_empty() {
            self.open_span(now, out);
            let text = std::mem::take(&mut self.buffer);
            self.emit_reasoning(text, out);
        }
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            if self.span_open || !text.trim().is_empty() {
                self.open_span(now, out);
                self.emit_reasoning(text, out);
            }
        }
        self.close_span(now, out);
        self.phase = Phase::Closed;
    }

    /// Hidden mode never opens a span; redacted spans carry the placeholder.
    fn open_span(&mut self, now: Instant, out: &mut Vec<String>) {
        if self.span_open || self.mode == ReasoningMode::Hidden {
            return;
        }
        self.started_at.get_or_insert(now);
        self.span_open = true;
        push(out, markers::THINK_OPEN.to_string());
        if self.mode == ReasoningMode::Redacted {
            push(out, self.placeholder.clone());
        }
    }

    fn close_span(&mut self, now: Instant, out: &mut Vec<String>) {
        if !self.span_open {
            return;
        }
        self.span_open = false;
        let started = self.started_at.unwrap_or(now);
        let seconds = markers::span_seconds(now.saturating_duration_since(started));
        push(out, markers::think_close(seconds));
    }

    fn emit_reasoning(&mut self, text: String, out: &mut Vec<String>) {
        if self.mode != ReasoningMode::Visible {
            return;
        }
        self.reasoning_text.push_str(&text);
        push(out, text);
    }

    fn emit_content(&mut self, text: &str, out: &mut Vec<String>) {
        self.content_seen = true;
        let text = if self.native {
            markers::escape_inline_tags(text).into_owned()
        } else {
            text.to_string()
        };
        push(out, text);
    }
}

fn push(out: &mut Vec<String>, text: String) {
    if !text.is_empty() {
        out.push(text);
    }
}

fn tail_chars(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}
