//! Fragment-boundary properties of the reasoning classifier

use std::time::Instant;

use proptest::prelude::*;
use unistream::config::EngineConfig;
use unistream::markers::think_close;
use unistream::streaming::{ReasoningClassifier, ReasoningMode};

/// Split `text` at the given byte offsets (ASCII input only).
fn split_at_points(text: &str, mut points: Vec<usize>) -> Vec<String> {
    points.retain(|p| *p > 0 && *p < text.len());
    points.sort_unstable();
    points.dedup();
    let mut out = Vec::new();
    let mut last = 0;
    for point in points {
        out.push(text[last..point].to_string());
        last = point;
    }
    out.push(text[last..].to_string());
    out
}

fn feed_reasoning(mode: ReasoningMode, fragments: &[String]) -> String {
    let mut classifier = ReasoningClassifier::new(mode, &EngineConfig::default());
    let now = Instant::now();
    let mut out = String::new();
    for fragment in fragments {
        out.extend(classifier.on_reasoning(fragment, now));
    }
    out.extend(classifier.finish(now));
    out
}

proptest! {
    #[test]
    fn inline_tags_are_independent_of_fragment_boundaries(
        points in prop::collection::vec(0usize..25, 0..6)
    ) {
        let text = "<think>plan</think>answer";
        let fragments = split_at_points(text, points);
        let output = feed_reasoning(ReasoningMode::Visible, &fragments);
        prop_assert_eq!(output, format!("<think>plan{}answer", think_close(1)));
    }

    #[test]
    fn hidden_mode_passes_content_through_unchanged(
        reasoning in prop::collection::vec("[a-z .]{0,16}", 0..4),
        content in prop::collection::vec("[a-zA-Z0-9 ,.!?]{0,16}", 1..6),
    ) {
        let mut classifier = ReasoningClassifier::new(ReasoningMode::Hidden, &EngineConfig::default());
        let now = Instant::now();
        let mut out = String::new();
        for fragment in &reasoning {
            out.extend(classifier.on_reasoning(fragment, now));
        }
        for fragment in &content {
            out.extend(classifier.on_content(fragment, now));
        }
        out.extend(classifier.finish(now));
        prop_assert_eq!(out, content.concat());
    }

    #[test]
    fn untagged_reasoning_is_one_span(
        reasoning in prop::collection::vec("[a-z ]{1,20}", 1..8),
        answer in "[A-Z][a-z]{0,10}",
    ) {
        let mut classifier = ReasoningClassifier::new(ReasoningMode::Visible, &EngineConfig::default());
        let now = Instant::now();
        let mut out = String::new();
        for fragment in &reasoning {
            out.extend(classifier.on_reasoning(fragment, now));
        }
        out.extend(classifier.on_content(&answer, now));
        out.extend(classifier.finish(now));
        prop_assert_eq!(
            out,
            format!("<think>{}{}{}", reasoning.concat(), think_close(1), answer)
        );
    }
}
