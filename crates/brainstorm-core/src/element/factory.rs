//! Builds element records with ids, defaults and connector anchoring.

use super::geometry::{boundary_point, unit_direction};
use super::model::{Connector, GeometryKind, Point, Shape, Text};
use crate::config::LayoutSettings;
use crate::error::{BrainstormError, Result};
use uuid::Uuid;

const DEFAULT_FILL: &str = "#ffffff";
const DIAMOND_FILL: &str = "#eef2f5";
const LINE_HEIGHT: f64 = 1.25;
const CHAR_WIDTH_FACTOR: f64 = 0.6;
const MIN_TEXT_WIDTH: f64 = 20.0;
const TEXT_PADDING: f64 = 16.0;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Estimated rendered width of `content` at `font_size`, padding included.
pub fn estimate_text_width(content: &str, font_size: f64) -> f64 {
    let chars = content.chars().count() as f64;
    (chars * font_size * CHAR_WIDTH_FACTOR).ceil().max(MIN_TEXT_WIDTH) + TEXT_PADDING
}

/// Height of a single line of text at `font_size`.
pub fn line_height(font_size: f64) -> f64 {
    (font_size * LINE_HEIGHT).round()
}

/// Creates shapes, texts and connectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementFactory {
    layout: LayoutSettings,
}

impl ElementFactory {
    pub fn new(layout: LayoutSettings) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &LayoutSettings {
        &self.layout
    }

    /// Creates a shape with a fresh id. Missing sizes fall back to the
    /// configured default (120×60 unless overridden).
    pub fn make_shape(
        &self,
        geometry: GeometryKind,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
        label: impl Into<String>,
    ) -> Shape {
        let background_color = match geometry {
            GeometryKind::Diamond => DIAMOND_FILL,
            _ => DEFAULT_FILL,
        };

        Shape {
            id: new_id(),
            geometry,
            x,
            y,
            width: width.filter(|w| *w > 0.0).unwrap_or(self.layout.shape_width),
            height: height.filter(|h| *h > 0.0).unwrap_or(self.layout.shape_height),
            label: label.into(),
            background_color: background_color.to_string(),
            bound_text_id: None,
        }
    }

    /// Creates a free-standing text. Missing sizes are estimated from the
    /// content and font size.
    pub fn make_text(
        &self,
        content: impl Into<String>,
        x: f64,
        y: f64,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Text {
        let content = content.into();
        let font_size = self.layout.font_size;

        Text {
            id: new_id(),
            width: width.unwrap_or_else(|| estimate_text_width(&content, font_size)),
            height: height.unwrap_or_else(|| line_height(font_size)),
            content,
            x,
            y,
            font_size,
            container_id: None,
        }
    }

    /// Creates a text centered inside `container` and binds it.
    ///
    /// Any previous binding on the container is replaced.
    pub fn make_bound_text(&self, container: &mut Shape, content: impl Into<String>) -> Text {
        let mut text = self.make_text(content, 0.0, 0.0, None, None);
        text.x = container.x + (container.width - text.width) / 2.0;
        text.y = container.y + (container.height - text.height) / 2.0;
        bind_text(container, &mut text);
        text
    }

    /// Creates a connector anchored on both shapes' outlines.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEndpoints` if either shape is missing.
    pub fn make_connector(&self, start: Option<&Shape>, end: Option<&Shape>) -> Result<Connector> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            (start, end) => {
                return Err(BrainstormError::InvalidEndpoints {
                    start: start.map(|s| s.id.clone()),
                    end: end.map(|s| s.id.clone()),
                });
            }
        };

        let forward = unit_direction(start.center(), end.center());
        let backward = Point::new(-forward.x, -forward.y);
        let anchor_start = boundary_point(start, forward);
        let anchor_end = boundary_point(end, backward);
        let dx = anchor_end.x - anchor_start.x;
        let dy = anchor_end.y - anchor_start.y;

        Ok(Connector {
            id: new_id(),
            start_ref: start.id.clone(),
            end_ref: end.id.clone(),
            anchor_start,
            anchor_end,
            x: anchor_start.x,
            y: anchor_start.y,
            width: dx.abs(),
            height: dy.abs(),
            points: vec![Point::new(0.0, 0.0), Point::new(dx, dy)],
            label: None,
        })
    }
}

/// Binds `text` to `container`, replacing any earlier binding.
pub fn bind_text(container: &mut Shape, text: &mut Text) {
    container.bound_text_id = Some(text.id.clone());
    text.container_id = Some(container.id.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ElementFactory {
        ElementFactory::default()
    }

    #[test]
    fn test_make_shape_defaults() {
        let shape = factory().make_shape(GeometryKind::Rectangle, 10.0, 20.0, None, None, "User");
        assert_eq!((shape.width, shape.height), (120.0, 60.0));
        assert_eq!(shape.background_color, "#ffffff");
        assert!(shape.bound_text_id.is_none());
        assert!(!shape.id.is_empty());

        let diamond = factory().make_shape(GeometryKind::Diamond, 0.0, 0.0, Some(80.0), None, "LB");
        assert_eq!(diamond.width, 80.0);
        assert_eq!(diamond.background_color, "#eef2f5");
    }

    #[test]
    fn test_make_shape_ids_are_unique() {
        let a = factory().make_shape(GeometryKind::Rectangle, 0.0, 0.0, None, None, "A");
        let b = factory().make_shape(GeometryKind::Rectangle, 0.0, 0.0, None, None, "A");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_text_size_estimation() {
        let text = factory().make_text("User", 0.0, 0.0, None, None);
        // 4 chars * 20 * 0.6 = 48, plus 16 padding
        assert_eq!(text.width, 64.0);
        assert_eq!(text.height, 25.0);

        let tiny = factory().make_text("", 0.0, 0.0, None, None);
        assert_eq!(tiny.width, 36.0);

        let sized = factory().make_text("x", 0.0, 0.0, Some(200.0), Some(40.0));
        assert_eq!((sized.width, sized.height), (200.0, 40.0));
    }

    #[test]
    fn test_bound_text_is_centered_and_rebinding_replaces() {
        let f = factory();
        let mut shape = f.make_shape(GeometryKind::Rectangle, 100.0, 100.0, None, None, "User");
        let first = f.make_bound_text(&mut shape, "User");

        assert_eq!(first.container_id.as_deref(), Some(shape.id.as_str()));
        assert_eq!(shape.bound_text_id.as_deref(), Some(first.id.as_str()));
        assert_eq!(first.x + first.width / 2.0, shape.center().x);
        assert_eq!(first.y + first.height / 2.0, shape.center().y);

        let second = f.make_bound_text(&mut shape, "Client");
        assert_eq!(shape.bound_text_id.as_deref(), Some(second.id.as_str()));
    }

    #[test]
    fn test_connector_requires_both_endpoints() {
        let f = factory();
        let shape = f.make_shape(GeometryKind::Rectangle, 0.0, 0.0, None, None, "A");

        let err = f.make_connector(Some(&shape), None).unwrap_err();
        assert!(matches!(err, BrainstormError::InvalidEndpoints { start: Some(_), end: None }));
        assert!(f.make_connector(None, None).is_err());
    }

    #[test]
    fn test_connector_anchors_on_facing_edges() {
        let f = factory();
        let left = f.make_shape(GeometryKind::Rectangle, 100.0, 100.0, None, None, "User");
        let right = f.make_shape(GeometryKind::Diamond, 350.0, 100.0, None, None, "Load Balancer");

        let connector = f.make_connector(Some(&left), Some(&right)).unwrap();
        assert_eq!(connector.start_ref, left.id);
        assert_eq!(connector.end_ref, right.id);
        // Right edge of the rectangle, left tip of the diamond.
        assert_eq!(connector.anchor_start, Point::new(220.0, 130.0));
        assert!((connector.anchor_end.x - 350.0).abs() < 1e-9);
        assert!((connector.anchor_end.y - 130.0).abs() < 1e-9);
        assert!((connector.width - 130.0).abs() < 1e-9);
        assert!(connector.height.abs() < 1e-9);
    }

    #[test]
    fn test_connector_between_coincident_shapes() {
        let f = factory();
        let a = f.make_shape(GeometryKind::Rectangle, 0.0, 0.0, None, None, "A");
        let b = f.make_shape(GeometryKind::Rectangle, 0.0, 0.0, None, None, "B");

        let connector = f.make_connector(Some(&a), Some(&b)).unwrap();
        assert_eq!(connector.anchor_start, Point::new(120.0, 30.0));
        assert_eq!(connector.anchor_end, Point::new(0.0, 30.0));
    }
}
