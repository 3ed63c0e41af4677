//! The external generator seam.
//!
//! The core never talks to a model directly. Everything that crosses that
//! boundary goes through [`Generator::invoke`], and whatever comes back is a
//! [`RawOutput`] that the repair and plan extraction layers normalize.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which prompt context a generator call is made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorRole {
    IntentClassifier,
    StepPlanner,
    StepExecutor,
    FreeChat,
}

impl GeneratorRole {
    pub const ALL: [GeneratorRole; 4] = [
        GeneratorRole::IntentClassifier,
        GeneratorRole::StepPlanner,
        GeneratorRole::StepExecutor,
        GeneratorRole::FreeChat,
    ];

    /// Stable identifier used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorRole::IntentClassifier => "intent_classifier",
            GeneratorRole::StepPlanner => "step_planner",
            GeneratorRole::StepExecutor => "step_executor",
            GeneratorRole::FreeChat => "free_chat",
        }
    }
}

impl fmt::Display for GeneratorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the generator is asked to format its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Constrain the model to emit JSON.
    Json,
    /// Free-form text.
    Text,
}

/// Configuration record selecting model and prompt for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorProfile {
    pub role: GeneratorRole,
    pub model_id: String,
    /// System prompt sent ahead of the rendered user message.
    pub system_prompt: String,
    /// `minijinja` template for the user message. Receives `request`,
    /// `board` and `history`.
    pub prompt_template: String,
    pub response_mode: ResponseMode,
    pub temperature: f32,
    /// Whether to let reasoning models think before answering.
    #[serde(default)]
    pub think: bool,
}

/// One call to the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorRequest {
    pub role: GeneratorRole,
    pub user_text: String,
    pub board_context: String,
    /// Recent conversation, already rendered as text. Empty for plan calls.
    pub history: String,
    /// Raw image bytes (PNG/JPEG) to attach, if any.
    pub images: Vec<Vec<u8>>,
}

impl GeneratorRequest {
    pub fn new(
        role: GeneratorRole,
        user_text: impl Into<String>,
        board_context: impl Into<String>,
    ) -> Self {
        Self {
            role,
            user_text: user_text.into(),
            board_context: board_context.into(),
            history: String::new(),
            images: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = history.into();
        self
    }

    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = images;
        self
    }
}

/// Whatever the generator handed back, before any repair.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    Text(String),
    Structured(Value),
}

impl RawOutput {
    /// The output rendered as text, used when everything else fails.
    pub fn to_text(&self) -> String {
        match self {
            RawOutput::Text(text) => text.clone(),
            RawOutput::Structured(Value::String(text)) => text.clone(),
            RawOutput::Structured(value) => value.to_string(),
        }
    }
}

impl From<String> for RawOutput {
    fn from(text: String) -> Self {
        RawOutput::Text(text)
    }
}

impl From<&str> for RawOutput {
    fn from(text: &str) -> Self {
        RawOutput::Text(text.to_string())
    }
}

impl From<Value> for RawOutput {
    fn from(value: Value) -> Self {
        RawOutput::Structured(value)
    }
}

/// The external language-model collaborator.
///
/// Implementations must map transport failures (connect, timeout, non-2xx) to
/// `BrainstormError::GeneratorUnavailable`. Retry policy, if any, belongs to
/// the implementation.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn invoke(&self, request: GeneratorRequest) -> Result<RawOutput>;
}
