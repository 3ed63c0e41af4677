//! Fallback path: derive elements from the step text alone.

use super::canvas::Canvas;
use super::vocabulary::Vocabulary;
use crate::element::{ElementFactory, GeometryKind};
use once_cell::sync::Lazy;
use regex::Regex;

static FROM_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfrom\s+(.+?)\s+(?:to|into|towards)\s+(.+?)[\s.!]*$")
        .expect("from/to pattern is valid")
});

static CONNECT_TO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:connect(?:s|ed|ing)?|link(?:s|ed|ing)?)",
        r"\s+(.+?)\s+(?:to|with|and)\s+(.+?)[\s.!]*$",
    ))
    .expect("connect pattern is valid")
});

static ARROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(.+?)\s*(?:->|→)\s*(.+?)[\s.!]*$").expect("arrow pattern is valid")
});

static LEADING_ARTICLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:the|a|an)\s+").expect("article pattern is valid"));

/// Applies one step description to the canvas.
pub(crate) fn apply_step(
    factory: &ElementFactory,
    vocabulary: &Vocabulary,
    canvas: &mut Canvas<'_>,
    step: &str,
) {
    let step = step.trim();
    if step.is_empty() {
        return;
    }

    if Vocabulary::mentions_connection(step)
        && connect_from_text(factory, vocabulary, canvas, step)
    {
        return;
    }

    let (label, geometry) = match vocabulary.classify(step) {
        Some(entry) => (entry.label.to_string(), entry.geometry),
        None => (step.to_string(), GeometryKind::Rectangle),
    };

    if canvas.shape_for_label(&label).is_some() {
        tracing::debug!("[Synthesizer] Fallback shape {:?} already on the board", label);
        return;
    }

    let previous = canvas.last_shape().map(|shape| shape.id.clone());
    let layout = factory.layout();
    let x = layout.slot_x(canvas.shape_count());
    let mut shape = factory.make_shape(geometry, x, layout.y_start, None, None, label.as_str());
    let text = factory.make_bound_text(&mut shape, label.as_str());
    let shape_id = shape.id.clone();
    canvas.add_shape(shape, Some(text));

    if let Some(previous) = previous {
        canvas.connect(factory, &previous, &shape_id, None);
    }
}

/// Connects two shapes named in `step`. Endpoints that are not yet on the
/// board defer the connection; nothing is guessed.
///
/// Returns `false` when no endpoint pair is named, so the step can be drawn
/// as a shape instead.
fn connect_from_text(
    factory: &ElementFactory,
    vocabulary: &Vocabulary,
    canvas: &mut Canvas<'_>,
    step: &str,
) -> bool {
    let Some((start_label, end_label)) = endpoint_labels(vocabulary, step) else {
        tracing::debug!("[Synthesizer] No endpoints recognized in {:?}", step);
        return false;
    };

    let start = canvas.shape_for_label(&start_label).map(str::to_string);
    let end = canvas.shape_for_label(&end_label).map(str::to_string);
    match (start, end) {
        (Some(start), Some(end)) => {
            canvas.connect(factory, &start, &end, None);
        }
        _ => tracing::debug!(
            "[Synthesizer] Deferring {:?} -> {:?}: endpoint not on the board",
            start_label,
            end_label
        ),
    }
    true
}

/// Extracts `(start, end)` labels, canonicalized through the vocabulary.
fn endpoint_labels(vocabulary: &Vocabulary, step: &str) -> Option<(String, String)> {
    let explicit = [&*FROM_TO, &*CONNECT_TO, &*ARROW].iter().find_map(|pattern| {
        let captures = pattern.captures(step)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
    });

    if let Some((start, end)) = explicit {
        return Some((canonical(vocabulary, start), canonical(vocabulary, end)));
    }

    let found = vocabulary.find_in_order(step);
    match found.as_slice() {
        [first, second, ..] => Some((
            first.entry.label.to_string(),
            second.entry.label.to_string(),
        )),
        _ => None,
    }
}

fn canonical(vocabulary: &Vocabulary, phrase: &str) -> String {
    let phrase = LEADING_ARTICLE.replace(phrase.trim(), "");
    match vocabulary.classify(&phrase) {
        Some(entry) => entry.label.to_string(),
        None => phrase.trim().to_string(),
    }
}
