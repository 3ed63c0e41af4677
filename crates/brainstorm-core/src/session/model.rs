//! Session domain model.

use super::message::{ChatMessage, MessageRole, render_history};
use super::state::InFlight;
use crate::element::Element;
use serde::{Deserialize, Serialize};

/// Everything the core keeps for one connection.
///
/// A session is created when a connection opens and dropped when it closes.
/// Plan fields are only mutated through the state machine methods in
/// `state.rs`; elements are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Connection identity this session belongs to
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    pub chat_history: Vec<ChatMessage>,
    /// Every element on the board, in creation order
    pub elements: Vec<Element>,
    pub(crate) plan_steps: Vec<String>,
    pub(crate) current_step: usize,
    pub(crate) plan_complete: bool,
    /// Incremented by every planning request; stale results are rejected.
    pub(crate) planning_round: u64,
    #[serde(skip)]
    pub(crate) in_flight: Option<InFlight>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: chrono::Utc::now().to_rfc3339(),
            chat_history: Vec::new(),
            elements: Vec::new(),
            plan_steps: Vec::new(),
            current_step: 0,
            plan_complete: false,
            planning_round: 0,
            in_flight: None,
        }
    }

    pub fn plan_steps(&self) -> &[String] {
        &self.plan_steps
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn plan_complete(&self) -> bool {
        self.plan_complete
    }

    pub fn record_message(&mut self, sender: MessageRole, text: impl Into<String>) {
        self.chat_history.push(ChatMessage::new(sender, text));
    }

    /// The last `tail` chat messages, oldest first.
    pub fn recent_history(&self, tail: usize) -> &[ChatMessage] {
        let start = self.chat_history.len().saturating_sub(tail);
        &self.chat_history[start..]
    }

    /// The last `tail` chat messages rendered as prompt lines.
    pub fn history_text(&self, tail: usize) -> String {
        render_history(self.recent_history(tail))
    }

    /// Appends elements produced outside the plan (free chat). Plan fields are
    /// left untouched.
    pub fn merge_elements(&mut self, elements: Vec<Element>) {
        self.elements.extend(elements);
    }
}
