//! Marker syntax embedded in the chunk stream.
//!
//! Downstream renderers split the transcript on these literal strings, so
//! their byte layout must not change:
//!
//! - reasoning open: `<think>`
//! - reasoning close: `</think><thinkmeta seconds="N"/>`
//! - tool invocation: `<tool-call name="NAME" data-input="BASE64"></tool-call>`

use std::borrow::Cow;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use regex::Regex;

pub const THINK_OPEN: &str = "<think>";
pub const THINK_CLOSE: &str = "</think>";

/// Inline reasoning tags recognised inside vendor text, lowercase.
pub const INLINE_TAGS: [&str; 4] = ["<think>", "</think>", "<thinking>", "</thinking>"];

static INLINE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?think(?:ing)?>").expect("valid inline tag regex"));

static INLINE_OPEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<think(?:ing)?>").expect("valid opening tag regex"));

static INLINE_CLOSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</think(?:ing)?>").expect("valid closing tag regex"));

static TOOL_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<tool-call name="([^"]*)" data-input="([A-Za-z0-9+/=]*)"></tool-call>"#)
        .expect("valid tool-call marker regex")
});

/// Whole seconds for a span's close marker, never below one.
pub fn span_seconds(elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis() as f64;
    ((ms / 1000.0).round() as u64).max(1)
}

pub fn think_close(seconds: u64) -> String {
    format!("{THINK_CLOSE}<thinkmeta seconds=\"{seconds}\"/>")
}

/// Atomic tool invocation marker. The input is rendered as compact JSON.
pub fn tool_call_marker(name: &str, input: &serde_json::Value) -> String {
    let json = input.to_string();
    format!(
        "<tool-call name=\"{}\" data-input=\"{}\"></tool-call>",
        escape_attribute(name),
        STANDARD.encode(json.as_bytes())
    )
}

/// A tool-call marker recovered from transcript text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedToolCallMarker {
    pub name: String,
    pub input: serde_json::Value,
}

/// Parse every well-formed tool-call marker in `text`, in order.
///
/// Markers with undecodable payloads are skipped.
pub fn parse_tool_call_markers(text: &str) -> Vec<ParsedToolCallMarker> {
    TOOL_CALL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let bytes = STANDARD.decode(&caps[2]).ok()?;
            let input = serde_json::from_slice(&bytes).ok()?;
            Some(ParsedToolCallMarker {
                name: unescape_attribute(&caps[1]),
                input,
            })
        })
        .collect()
}

pub fn contains_inline_tag(text: &str) -> bool {
    INLINE_TAG_RE.is_match(text)
}

/// Remove every opening inline tag.
pub fn strip_inline_openers(text: &str) -> Cow<'_, str> {
    INLINE_OPEN_RE.replace_all(text, "")
}

/// Byte range of the first closing inline tag.
pub fn find_inline_closer(text: &str) -> Option<(usize, usize)> {
    INLINE_CLOSE_RE.find(text).map(|m| (m.start(), m.end()))
}

/// Start of a trailing fragment that could still grow into an inline tag.
///
/// Mirrors a suffix/prefix match: the longest suffix of `text` that is a
/// case-insensitive prefix of a recognised tag.
pub fn partial_tag_start(text: &str) -> Option<usize> {
    let longest = INLINE_TAGS.iter().map(|tag| tag.len()).max().unwrap_or(0);
    let floor = text.len().saturating_sub(longest);
    text.char_indices()
        .map(|(i, _)| i)
        .filter(|&i| i >= floor)
        .find(|&i| {
            let suffix = text[i..].to_ascii_lowercase();
            suffix.starts_with('<')
                && INLINE_TAGS
                    .iter()
                    .any(|tag| tag.starts_with(&suffix) && tag.len() > suffix.len())
        })
}

/// Entity-escape inline reasoning tags so they render as text.
pub fn escape_inline_tags(text: &str) -> Cow<'_, str> {
    INLINE_TAG_RE.replace_all(text, |caps: &regex::Captures<'_>| {
        let tag = &caps[0];
        format!("&lt;{}&gt;", &tag[1..tag.len() - 1])
    })
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn unescape_attribute(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}
