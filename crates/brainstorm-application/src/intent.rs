//! Routing of free-form messages by classified intent.

use brainstorm_core::generator::{GeneratorRole, RawOutput};
use brainstorm_core::{BrainstormError, Result};
use serde::Deserialize;
use serde_json::Value;

/// The classifier's answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub intent: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Intent {
    /// Role that should answer a message of this intent.
    ///
    /// `chat` goes to free chat; `think` and `multimodal` go to the executor.
    /// Any other type is reported as `UnknownIntentType`.
    pub fn route(&self) -> Result<GeneratorRole> {
        match self.kind.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(GeneratorRole::FreeChat),
            "think" | "multimodal" => Ok(GeneratorRole::StepExecutor),
            other => Err(BrainstormError::UnknownIntentType(other.to_string())),
        }
    }
}

/// Reads the classifier output, tolerating prose around the JSON object.
pub fn parse_intent(raw: &RawOutput) -> Option<Intent> {
    let value = match raw {
        RawOutput::Structured(Value::String(text)) | RawOutput::Text(text) => object_in_text(text)?,
        RawOutput::Structured(value) => value.clone(),
    };
    serde_json::from_value(value).ok()
}

fn object_in_text(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Role for a classifier result, defaulting to the executor when the
/// classification is missing or unrecognized.
pub fn route_for(raw: &RawOutput) -> GeneratorRole {
    let Some(intent) = parse_intent(raw) else {
        tracing::warn!("[Intent] Unparseable classifier output, defaulting to executor");
        return GeneratorRole::StepExecutor;
    };

    match intent.route() {
        Ok(role) => role,
        Err(err) => {
            tracing::warn!("[Intent] {}, defaulting to executor", err);
            GeneratorRole::StepExecutor
        }
    }
}
