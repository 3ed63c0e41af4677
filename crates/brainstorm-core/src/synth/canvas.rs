//! Working view of the board during one synthesis call.
//!
//! Holds the session's existing elements plus everything created so far in
//! the current batch, and indexes shapes by id, record alias and normalized
//! label so that later records can reference earlier ones.

use crate::element::{Element, ElementFactory, GeometryKind, Shape, Text};
use std::collections::{HashMap, HashSet};

/// Normalizes a label for identity comparison: trimmed, lowercased, inner
/// whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) struct Canvas<'a> {
    existing: &'a [Element],
    created: Vec<Element>,
    labels: HashMap<String, String>,
    aliases: HashMap<String, String>,
    edges: HashSet<(String, String)>,
    /// Normalized content of free-standing texts.
    free_texts: HashSet<String>,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(existing: &'a [Element]) -> Self {
        let mut labels = HashMap::new();
        let mut edges = HashSet::new();
        let mut free_texts = HashSet::new();
        for element in existing {
            match element {
                Element::Shape(shape) => {
                    let key = normalize_label(&shape.label);
                    if !key.is_empty() {
                        labels.entry(key).or_insert_with(|| shape.id.clone());
                    }
                }
                Element::Connector(connector) => {
                    edges.insert((connector.start_ref.clone(), connector.end_ref.clone()));
                }
                Element::Text(text) if text.container_id.is_none() => {
                    free_texts.insert(normalize_label(&text.content));
                }
                Element::Text(_) => {}
            }
        }

        Self {
            existing,
            created: Vec::new(),
            labels,
            aliases: HashMap::new(),
            edges,
            free_texts,
        }
    }

    pub(crate) fn into_created(self) -> Vec<Element> {
        self.created
    }

    fn all(&self) -> impl Iterator<Item = &Element> {
        self.existing.iter().chain(self.created.iter())
    }

    pub(crate) fn shape(&self, id: &str) -> Option<&Shape> {
        self.all()
            .filter_map(Element::as_shape)
            .find(|shape| shape.id == id)
    }

    /// Number of shapes on the board, used for grid placement.
    pub(crate) fn shape_count(&self) -> usize {
        self.all().filter(|element| element.is_shape()).count()
    }

    /// The most recently created shape.
    pub(crate) fn last_shape(&self) -> Option<&Shape> {
        self.all().filter_map(Element::as_shape).last()
    }

    /// Shape id registered for a label, if any.
    pub(crate) fn shape_for_label(&self, label: &str) -> Option<&str> {
        self.labels.get(&normalize_label(label)).map(String::as_str)
    }

    /// Resolves a reference by shape id, then by record alias, then by label.
    pub(crate) fn resolve(&self, reference: &str) -> Option<String> {
        let reference = reference.trim();
        if self.shape(reference).is_some() {
            return Some(reference.to_string());
        }
        if let Some(id) = self.aliases.get(reference) {
            return Some(id.clone());
        }
        self.shape_for_label(reference).map(str::to_string)
    }

    /// Records that a generator-side id refers to `shape_id`.
    pub(crate) fn alias(&mut self, record_id: &str, shape_id: &str) {
        if record_id != shape_id {
            self.aliases.insert(record_id.to_string(), shape_id.to_string());
        }
    }

    /// Adds a shape (and its label text) and registers its label.
    pub(crate) fn add_shape(&mut self, shape: Shape, text: Option<Text>) {
        let key = normalize_label(&shape.label);
        if !key.is_empty() {
            self.labels.insert(key, shape.id.clone());
        }
        self.created.push(Element::Shape(shape));
        if let Some(text) = text {
            self.created.push(Element::Text(text));
        }
    }

    /// Whether a free-standing text with this content is on the board.
    pub(crate) fn has_free_text(&self, content: &str) -> bool {
        self.free_texts.contains(&normalize_label(content))
    }

    /// Unlabeled shape of `geometry` placed exactly at `(x, y)`, if any.
    pub(crate) fn unlabeled_shape_at(
        &self,
        geometry: GeometryKind,
        x: f64,
        y: f64,
    ) -> Option<&str> {
        self.all()
            .filter_map(Element::as_shape)
            .find(|shape| {
                shape.label.trim().is_empty()
                    && shape.geometry == geometry
                    && shape.x == x
                    && shape.y == y
            })
            .map(|shape| shape.id.as_str())
    }

    pub(crate) fn add_text(&mut self, text: Text) {
        if text.container_id.is_none() {
            self.free_texts.insert(normalize_label(&text.content));
        }
        self.created.push(Element::Text(text));
    }

    /// Connects two shapes by id. Returns whether a connector was created.
    ///
    /// Unknown endpoints and already-connected pairs create nothing.
    pub(crate) fn connect(
        &mut self,
        factory: &ElementFactory,
        start_id: &str,
        end_id: &str,
        label: Option<&str>,
    ) -> bool {
        if start_id == end_id {
            tracing::debug!("[Synthesizer] Skipping self-connection on {}", start_id);
            return false;
        }
        let pair = (start_id.to_string(), end_id.to_string());
        if self.edges.contains(&pair) {
            tracing::debug!("[Synthesizer] {} -> {} already connected", start_id, end_id);
            return false;
        }

        let made = factory.make_connector(self.shape(start_id), self.shape(end_id));
        let mut connector = match made {
            Ok(connector) => connector,
            Err(err) => {
                tracing::debug!("[Synthesizer] Skipping connector: {}", err);
                return false;
            }
        };

        connector.label = label.map(str::to_string);
        self.edges.insert(pair);
        self.created.push(Element::Connector(connector));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Load   Balancer "), "load balancer");
        assert_eq!(normalize_label("USER"), normalize_label("user"));
        assert_eq!(normalize_label("   "), "");
    }
}
