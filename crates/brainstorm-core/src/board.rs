//! Condensed board context sent to the generator for grounding.
//!
//! Shapes and connectors are reduced to a handful of rounded fields, text
//! elements are dropped (their content already lives on the shape label), and
//! the serialized result is capped at a fixed character budget.

use crate::config::Limits;
use crate::element::Element;
use serde::Serialize;

/// Appended when the context or user text was cut.
pub const TRUNCATION_MARKER: &str = "...(truncated)";

#[derive(Debug, Serialize)]
struct BoardEntry<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    x: i64,
    y: i64,
    w: i64,
    h: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<&'a str>,
}

impl<'a> BoardEntry<'a> {
    fn from_element(element: &'a Element, label_chars: usize) -> Option<Self> {
        match element {
            Element::Shape(shape) => Some(Self {
                id: &shape.id,
                kind: shape.geometry.as_str(),
                x: shape.x.round() as i64,
                y: shape.y.round() as i64,
                w: shape.width.round() as i64,
                h: shape.height.round() as i64,
                label: Some(truncate_chars(&shape.label, label_chars)),
                start: None,
                end: None,
            }),
            Element::Connector(connector) => Some(Self {
                id: &connector.id,
                kind: "arrow",
                x: connector.x.round() as i64,
                y: connector.y.round() as i64,
                w: connector.width.round() as i64,
                h: connector.height.round() as i64,
                label: connector
                    .label
                    .as_deref()
                    .map(|label| truncate_chars(label, label_chars)),
                start: Some(&connector.start_ref),
                end: Some(&connector.end_ref),
            }),
            Element::Text(_) => None,
        }
    }
}

/// Builds the board context for `elements`, capped at
/// `limits.board_context_chars` characters (marker included in the excess).
pub fn board_context(elements: &[Element], limits: &Limits) -> String {
    let entries: Vec<BoardEntry<'_>> = elements
        .iter()
        .filter_map(|element| BoardEntry::from_element(element, limits.label_chars))
        .collect();

    let serialized = match serde_json::to_string(&entries) {
        Ok(serialized) => serialized,
        Err(err) => {
            tracing::warn!("[BoardContext] Failed to serialize board: {}", err);
            return "[]".to_string();
        }
    };
    cap_chars(&serialized, limits.board_context_chars)
}

/// Caps user text before it is sent to the generator.
pub fn cap_user_text(text: &str, limits: &Limits) -> String {
    cap_chars(text.trim(), limits.user_text_chars)
}

/// Returns `text` unchanged when it fits in `max_chars`; otherwise the first
/// `max_chars` characters followed by [`TRUNCATION_MARKER`].
pub fn cap_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
