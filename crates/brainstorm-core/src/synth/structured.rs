//! Structured path: element-like records from the repair parser.

use super::canvas::Canvas;
use crate::element::{ElementFactory, GeometryKind};
use serde_json::Value;

/// What a record asks for, read leniently from generator JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementRecord {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub label: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ElementRecord {
    /// Reads a record from a JSON value. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let field = |keys: &[&str]| keys.iter().find_map(|key| object.get(*key));

        Some(Self {
            id: field(&["id"]).and_then(as_text),
            kind: field(&["type", "kind", "shape"]).and_then(as_text),
            x: field(&["x"]).and_then(as_number),
            y: field(&["y"]).and_then(as_number),
            width: field(&["width", "w"]).and_then(as_number),
            height: field(&["height", "h"]).and_then(as_number),
            label: field(&["label", "text", "name", "title"]).and_then(as_label),
            start: field(&["start", "from", "source"]).and_then(as_reference),
            end: field(&["end", "to", "target"]).and_then(as_reference),
        })
    }

    fn is_connector(&self) -> bool {
        self.start.is_some()
            || self.end.is_some()
            || self.kind_is(&["arrow", "line", "connector", "edge"])
    }

    fn kind_is(&self, names: &[&str]) -> bool {
        self.kind
            .as_deref()
            .map(|kind| names.iter().any(|name| kind.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

/// Labels may arrive as plain strings or as `{"text": ...}` objects.
fn as_label(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => object.get("text").and_then(as_text),
        other => as_text(other),
    }
}

/// Endpoint references may be ids, labels, or `{"id": ...}` objects.
fn as_reference(value: &Value) -> Option<String> {
    match value {
        Value::Object(object) => ["id", "elementId", "label", "text"]
            .iter()
            .find_map(|key| object.get(*key).and_then(as_text)),
        other => as_text(other),
    }
}

/// Applies the records to the canvas in order.
pub(crate) fn apply_records(
    factory: &ElementFactory,
    canvas: &mut Canvas<'_>,
    records: &[Value],
) {
    for value in records {
        let Some(record) = ElementRecord::from_value(value) else {
            tracing::debug!("[Synthesizer] Ignoring non-object record: {}", value);
            continue;
        };

        if record.is_connector() {
            apply_connector(factory, canvas, &record);
        } else if record.kind_is(&["text", "label"]) {
            apply_text(factory, canvas, &record);
        } else {
            apply_shape(factory, canvas, &record);
        }
    }
}

fn apply_connector(factory: &ElementFactory, canvas: &mut Canvas<'_>, record: &ElementRecord) {
    let start = record.start.as_deref().and_then(|r| canvas.resolve(r));
    let end = record.end.as_deref().and_then(|r| canvas.resolve(r));

    match (start, end) {
        (Some(start), Some(end)) => {
            canvas.connect(factory, &start, &end, record.label.as_deref());
        }
        _ => tracing::debug!(
            "[Synthesizer] Skipping connector with unresolved endpoints: {:?} -> {:?}",
            record.start,
            record.end
        ),
    }
}

fn apply_text(factory: &ElementFactory, canvas: &mut Canvas<'_>, record: &ElementRecord) {
    let Some(content) = record.label.as_deref() else {
        return;
    };
    if canvas.has_free_text(content) {
        tracing::debug!("[Synthesizer] Text {:?} already on the board", content);
        return;
    }
    let layout = factory.layout();
    let x = record.x.unwrap_or_else(|| layout.slot_x(canvas.shape_count()));
    let y = record.y.unwrap_or(layout.y_start);
    let text = factory.make_text(content, x, y, record.width, record.height);
    canvas.add_text(text);
}

fn apply_shape(factory: &ElementFactory, canvas: &mut Canvas<'_>, record: &ElementRecord) {
    let label = record.label.clone().unwrap_or_default();
    let geometry = record
        .kind
        .as_deref()
        .and_then(GeometryKind::parse)
        .unwrap_or_default();

    let existing = if label.is_empty() {
        unlabeled_duplicate(canvas, record, geometry)
    } else {
        canvas.shape_for_label(&label).map(str::to_string)
    };
    if let Some(existing) = existing {
        tracing::debug!("[Synthesizer] Shape {:?} already on board as {}", label, existing);
        if let Some(record_id) = record.id.as_deref() {
            canvas.alias(record_id, &existing);
        }
        return;
    }

    let layout = factory.layout();
    let x = record.x.unwrap_or_else(|| layout.slot_x(canvas.shape_count()));
    let y = record.y.unwrap_or(layout.y_start);

    let mut shape = factory.make_shape(geometry, x, y, record.width, record.height, label.clone());
    let text = (!label.is_empty()).then(|| factory.make_bound_text(&mut shape, label.as_str()));
    if let Some(record_id) = record.id.as_deref() {
        canvas.alias(record_id, &shape.id);
    }
    canvas.add_shape(shape, text);
}

/// Unlabeled shapes have no identity but their explicit position.
fn unlabeled_duplicate(
    canvas: &Canvas<'_>,
    record: &ElementRecord,
    geometry: GeometryKind,
) -> Option<String> {
    let (x, y) = (record.x?, record.y?);
    canvas.unlabeled_shape_at(geometry, x, y).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_reads_lenient_fields() {
        let record = ElementRecord::from_value(&json!({
            "id": "lb",
            "type": "diamond",
            "x": "120",
            "y": 40,
            "label": {"text": "Load Balancer"},
        }))
        .unwrap();

        assert_eq!(record.id.as_deref(), Some("lb"));
        assert_eq!(record.x, Some(120.0));
        assert_eq!(record.label.as_deref(), Some("Load Balancer"));
        assert!(!record.is_connector());
    }

    #[test]
    fn test_record_endpoint_forms() {
        let record = ElementRecord::from_value(&json!({
            "type": "arrow",
            "start": {"id": "a"},
            "to": "Database",
        }))
        .unwrap();

        assert_eq!(record.start.as_deref(), Some("a"));
        assert_eq!(record.end.as_deref(), Some("Database"));
        assert!(record.is_connector());
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        assert!(ElementRecord::from_value(&json!("rectangle")).is_none());
        assert!(ElementRecord::from_value(&json!(3)).is_none());
    }
}
