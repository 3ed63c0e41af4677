//! Boundary anchoring for connectors.
//!
//! All functions take a unit direction vector pointing away from the shape
//! center and return the point where a ray in that direction leaves the
//! shape outline.

use super::model::{GeometryKind, Point, Shape};

/// Direction used when two centers coincide.
pub const DEFAULT_DIRECTION: Point = Point::new(1.0, 0.0);

/// Unit vector from `from` to `to`, or [`DEFAULT_DIRECTION`] when they coincide.
pub fn unit_direction(from: Point, to: Point) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length = dx.hypot(dy);
    if length <= f64::EPSILON {
        return DEFAULT_DIRECTION;
    }
    Point::new(dx / length, dy / length)
}

/// `numerator / |component|`, with division by zero treated as infinity.
fn reach(numerator: f64, component: f64) -> f64 {
    let magnitude = component.abs();
    if magnitude <= f64::EPSILON {
        f64::INFINITY
    } else {
        numerator / magnitude
    }
}

/// Scale factor along `dir` to reach the edge of an axis-aligned rectangle.
pub fn rectangle_scale(half_width: f64, half_height: f64, dir: Point) -> f64 {
    reach(half_width, dir.x).min(reach(half_height, dir.y))
}

/// Scale factor along `dir` solving `|x|/a + |y|/b = 1`.
pub fn diamond_scale(half_width: f64, half_height: f64, dir: Point) -> f64 {
    let denominator = dir.x.abs() / half_width + dir.y.abs() / half_height;
    1.0 / denominator
}

/// Scale factor along `dir` solving `(x/a)^2 + (y/b)^2 = 1`.
pub fn ellipse_scale(half_width: f64, half_height: f64, dir: Point) -> f64 {
    let nx = dir.x / half_width;
    let ny = dir.y / half_height;
    1.0 / (nx * nx + ny * ny).sqrt()
}

/// The point on `shape`'s outline in direction `dir` from its center.
///
/// Degenerate (zero-sized) shapes anchor at their center.
pub fn boundary_point(shape: &Shape, dir: Point) -> Point {
    let center = shape.center();
    let (half_width, half_height) = shape.half_extents();
    if half_width <= 0.0 || half_height <= 0.0 {
        return center;
    }

    let scale = match shape.geometry {
        GeometryKind::Rectangle => rectangle_scale(half_width, half_height, dir),
        GeometryKind::Diamond => diamond_scale(half_width, half_height, dir),
        GeometryKind::Ellipse | GeometryKind::Circle => ellipse_scale(half_width, half_height, dir),
    };

    Point::new(center.x + dir.x * scale, center.y + dir.y * scale)
}
