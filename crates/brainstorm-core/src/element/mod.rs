//! Diagram elements: records, geometry and the factory that builds them.

mod factory;
pub mod geometry;
mod model;

pub use factory::{ElementFactory, bind_text, estimate_text_width, line_height};
pub use model::{Connector, Element, GeometryKind, Point, Shape, Text, find_shape, shapes};
