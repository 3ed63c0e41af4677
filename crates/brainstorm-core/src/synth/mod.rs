//! Diagram synthesis: maps repaired records or step text onto factory calls.
//!
//! Two paths exist. The structured path consumes element-like records from
//! the repair parser. The fallback path works from the step text alone and is
//! only consulted when the structured path produced nothing for a plan step.
//! Both dedupe shapes by normalized label and connectors by endpoint pair, so
//! repeating a request never duplicates a concept on the board.

mod canvas;
mod fallback;
mod structured;
mod vocabulary;

pub use canvas::normalize_label;
pub use structured::ElementRecord;
pub use vocabulary::{DEFAULT_ENTRIES, KeywordMatch, Vocabulary, VocabularyEntry};

use crate::config::LayoutSettings;
use crate::element::{Element, ElementFactory};
use canvas::Canvas;
use serde_json::Value;

/// Which path produced a synthesis result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisPath {
    Structured,
    Fallback,
    /// Neither path produced anything.
    Empty,
}

/// Elements created by one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub elements: Vec<Element>,
    pub path: SynthesisPath,
}

/// Turns generator output and step descriptions into new board elements.
#[derive(Debug, Clone, Default)]
pub struct DiagramSynthesizer {
    factory: ElementFactory,
    vocabulary: Vocabulary,
}

impl DiagramSynthesizer {
    pub fn new(layout: LayoutSettings) -> Self {
        Self {
            factory: ElementFactory::new(layout),
            vocabulary: Vocabulary::default(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn factory(&self) -> &ElementFactory {
        &self.factory
    }

    /// Structured path only.
    pub fn from_records(&self, records: &[Value], existing: &[Element]) -> Vec<Element> {
        let mut canvas = Canvas::new(existing);
        structured::apply_records(&self.factory, &mut canvas, records);
        canvas.into_created()
    }

    /// Fallback path only.
    pub fn from_step_text(&self, step: &str, existing: &[Element]) -> Vec<Element> {
        let mut canvas = Canvas::new(existing);
        fallback::apply_step(&self.factory, &self.vocabulary, &mut canvas, step);
        canvas.into_created()
    }

    /// Synthesizes a plan step: structured path first, fallback when it
    /// yields nothing.
    pub fn synthesize_step(
        &self,
        step: &str,
        records: &[Value],
        existing: &[Element],
    ) -> Synthesis {
        let elements = self.from_records(records, existing);
        if !elements.is_empty() {
            return Synthesis {
                elements,
                path: SynthesisPath::Structured,
            };
        }

        tracing::debug!("[Synthesizer] Structured path empty, falling back for {:?}", step);
        let elements = self.from_step_text(step, existing);
        let path = if elements.is_empty() {
            tracing::warn!("[Synthesizer] No elements produced for step {:?}", step);
            SynthesisPath::Empty
        } else {
            SynthesisPath::Fallback
        };
        Synthesis { elements, path }
    }
}
