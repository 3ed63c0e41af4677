//! Configuration types shared across the workspace.
//!
//! Every field has a default so that a partial (or missing) `config.toml`
//! still yields a usable configuration. Loading from disk lives in
//! `brainstorm-interaction`.

use crate::generator::GeneratorRole;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration structure for `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BrainstormConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub layout: LayoutSettings,
}

/// Where and how the external generator is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Per-role model overrides, keyed by role id (e.g. `step_planner`).
    #[serde(default)]
    pub models: HashMap<String, String>,
}

impl GeneratorSettings {
    /// Returns the model configured for `role`, falling back to the default model.
    pub fn model_for(&self, role: GeneratorRole) -> &str {
        self.models
            .get(role.as_str())
            .map(String::as_str)
            .unwrap_or(&self.default_model)
    }
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            default_model: default_model(),
            timeout_secs: default_timeout_secs(),
            models: HashMap::new(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:11434/api/chat".to_string()
}

fn default_model() -> String {
    "deepseek-r1:1.5b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Character budgets applied before anything is sent to the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub board_context_chars: usize,
    pub user_text_chars: usize,
    pub label_chars: usize,
    pub history_tail: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            board_context_chars: 4000,
            user_text_chars: 2000,
            label_chars: 40,
            history_tail: 6,
        }
    }
}

/// Grid placement and sizing used when the generator gives no coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub x_start: f64,
    pub y_start: f64,
    pub x_step: f64,
    pub shape_width: f64,
    pub shape_height: f64,
    pub font_size: f64,
}

impl LayoutSettings {
    /// The x coordinate of grid slot `index` on the baseline row.
    pub fn slot_x(&self, index: usize) -> f64 {
        self.x_start + index as f64 * self.x_step
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            x_start: 100.0,
            y_start: 100.0,
            x_step: 250.0,
            shape_width: 120.0,
            shape_height: 60.0,
            font_size: 20.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: BrainstormConfig = toml::from_str(
            r#"
            [generator]
            default_model = "llama3"

            [generator.models]
            step_planner = "qwen2.5"

            [limits]
            board_context_chars = 500
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.generator.default_model, "llama3");
        assert_eq!(config.generator.endpoint, "http://localhost:11434/api/chat");
        assert_eq!(config.generator.model_for(GeneratorRole::StepPlanner), "qwen2.5");
        assert_eq!(config.generator.model_for(GeneratorRole::FreeChat), "llama3");
        assert_eq!(config.limits.board_context_chars, 500);
        assert_eq!(config.limits.user_text_chars, 2000);
        assert_eq!(config.layout, LayoutSettings::default());
    }

    #[test]
    fn test_slot_x() {
        let layout = LayoutSettings::default();
        assert_eq!(layout.slot_x(0), 100.0);
        assert_eq!(layout.slot_x(2), 600.0);
    }
}
