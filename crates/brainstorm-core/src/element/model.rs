//! Diagram element records.

use serde::{Deserialize, Serialize};

/// A point on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The outline a shape is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    #[default]
    Rectangle,
    Diamond,
    Ellipse,
    Circle,
}

impl GeometryKind {
    /// Parses a generator-supplied type name. Unknown names return `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectangle" | "rect" | "box" | "square" => Some(GeometryKind::Rectangle),
            "diamond" | "rhombus" | "decision" => Some(GeometryKind::Diamond),
            "ellipse" | "oval" => Some(GeometryKind::Ellipse),
            "circle" => Some(GeometryKind::Circle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryKind::Rectangle => "rectangle",
            GeometryKind::Diamond => "diamond",
            GeometryKind::Ellipse => "ellipse",
            GeometryKind::Circle => "circle",
        }
    }
}

/// A labelled diagram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: String,
    pub geometry: GeometryKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Human-readable label; also the deduplication key.
    pub label: String,
    pub background_color: String,
    /// Id of the Text laid out inside this shape. A back-reference only.
    pub bound_text_id: Option<String>,
}

impl Shape {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn half_extents(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// A text record, optionally laid out inside a container shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub id: String,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    pub container_id: Option<String>,
}

/// A directed edge between two shapes, anchored on their outlines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    pub start_ref: String,
    pub end_ref: String,
    pub anchor_start: Point,
    pub anchor_end: Point,
    /// Origin of the polyline; equal to `anchor_start`.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Polyline points relative to `(x, y)`.
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Any element that can sit on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Shape(Shape),
    Text(Text),
    Connector(Connector),
}

impl Element {
    pub fn id(&self) -> &str {
        match self {
            Element::Shape(shape) => &shape.id,
            Element::Text(text) => &text.id,
            Element::Connector(connector) => &connector.id,
        }
    }

    pub fn as_shape(&self) -> Option<&Shape> {
        match self {
            Element::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn as_connector(&self) -> Option<&Connector> {
        match self {
            Element::Connector(connector) => Some(connector),
            _ => None,
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Element::Shape(_))
    }
}

/// Iterates over the shapes in an element list.
pub fn shapes(elements: &[Element]) -> impl Iterator<Item = &Shape> {
    elements.iter().filter_map(Element::as_shape)
}

/// Finds a shape by id.
pub fn find_shape<'a>(elements: &'a [Element], id: &str) -> Option<&'a Shape> {
    shapes(elements).find(|shape| shape.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_kind_parse() {
        assert_eq!(GeometryKind::parse("Diamond"), Some(GeometryKind::Diamond));
        assert_eq!(GeometryKind::parse(" rect "), Some(GeometryKind::Rectangle));
        assert_eq!(GeometryKind::parse("arrow"), None);
    }

    #[test]
    fn test_element_serializes_with_type_tag() {
        let element = Element::Text(Text {
            id: "t1".into(),
            content: "User".into(),
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 25.0,
            font_size: 20.0,
            container_id: Some("s1".into()),
        });

        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["containerId"], "s1");
    }
}
