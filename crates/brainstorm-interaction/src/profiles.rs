//! Generator profiles, one per role.
//!
//! Roles differ only in data: model, system prompt, user-message template,
//! response mode and sampling settings. The table below is the single place
//! those are chosen.

use brainstorm_core::config::GeneratorSettings;
use brainstorm_core::generator::{GeneratorProfile, GeneratorRequest, GeneratorRole, ResponseMode};
use brainstorm_core::{BrainstormError, Result};
use minijinja::{Environment, context};
use std::collections::HashMap;

const ELEMENT_SCHEMA: &str = "\
Each element object must include \"type\" (rectangle, ellipse, circle, diamond, arrow, line, \
or text), \"x\" and \"y\" coordinates, \"width\" and \"height\" for shapes with size, and an \
optional \"text\" label. Give shapes an \"id\" and let arrows reference them with \"start\" \
and \"end\".";

const CLASSIFIER_PROMPT: &str = "\
You are a fast, lightweight assistant for a whiteboarding app. Your sole job is to classify \
the user's request so it can be routed. Return a JSON object with two keys: \"intent\" (a \
short verb phrase such as \"draw diagram\", \"modify diagram\", \"analyze diagram\", or \
\"chat\") and \"type\" (one of \"think\", \"multimodal\", or \"chat\"). Do not include any \
other fields, explanations, or formatting. If the intent is unclear, set \"intent\" to \
\"unknown\" and \"type\" to \"chat\". Use \"multimodal\" only if the user explicitly asks \
about an image of the diagram.";

const PLANNER_PROMPT: &str = "\
You plan whiteboard diagrams. Break the user's request into a short ordered list of small \
drawing steps, each adding one component or one connection, for example \"Add a load \
balancer\" or \"Connect user to load balancer\". Take the current board into account and do \
not repeat what is already drawn. Respond ONLY with a JSON object {\"steps\": [\"...\", \
\"...\"]}. Do not respond with Markdown or prose.";

const FREE_CHAT_PROMPT: &str = "\
You are a helpful assistant on a collaborative whiteboard. Answer the user's message \
concisely. If the user asks for something to be drawn, include the new shapes; otherwise \
return an empty \"elements\" array. Respond ONLY with a JSON object with keys \"reply\" \
(string) and \"elements\" (array).";

const REQUEST_TEMPLATE: &str = "\
{% if history %}Recent conversation:
{{ history }}

{% endif %}Current board:
{{ board }}

Request:
{{ request }}";

fn executor_prompt() -> String {
    format!(
        "You are a deep reasoning assistant helping users design systems on a whiteboard. \
         Given the current board summary and the requested step, decide which new shapes and \
         arrows to draw. Respond ONLY with a JSON object with two keys: \"reply\" (a concise \
         message explaining what you did) and \"elements\" (an array of element objects to add). \
         {ELEMENT_SCHEMA} Reuse the labels of shapes already on the board instead of redrawing \
         them. If nothing needs to be drawn, return an empty \"elements\" array. Do not respond \
         with Markdown or HTML."
    )
}

/// Built-in profile for `role`, using `model_id`.
pub fn default_profile(role: GeneratorRole, model_id: impl Into<String>) -> GeneratorProfile {
    let (system_prompt, temperature, think) = match role {
        GeneratorRole::IntentClassifier => (CLASSIFIER_PROMPT.to_string(), 0.2, false),
        GeneratorRole::StepPlanner => (PLANNER_PROMPT.to_string(), 0.2, false),
        GeneratorRole::StepExecutor => (executor_prompt(), 0.4, true),
        GeneratorRole::FreeChat => (FREE_CHAT_PROMPT.to_string(), 0.2, false),
    };

    GeneratorProfile {
        role,
        model_id: model_id.into(),
        system_prompt,
        prompt_template: REQUEST_TEMPLATE.to_string(),
        response_mode: ResponseMode::Json,
        temperature,
        think,
    }
}

/// Lookup table from role to profile.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    profiles: HashMap<GeneratorRole, GeneratorProfile>,
}

impl ProfileTable {
    /// Builds the table with per-role models taken from `settings`.
    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        let profiles = GeneratorRole::ALL
            .into_iter()
            .map(|role| (role, default_profile(role, settings.model_for(role))))
            .collect();
        Self { profiles }
    }

    pub fn get(&self, role: GeneratorRole) -> Result<&GeneratorProfile> {
        self.profiles
            .get(&role)
            .ok_or_else(|| BrainstormError::not_found("GeneratorProfile", role.as_str()))
    }

    /// Replaces the profile for its role.
    pub fn insert(&mut self, profile: GeneratorProfile) {
        self.profiles.insert(profile.role, profile);
    }
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self::from_settings(&GeneratorSettings::default())
    }
}

/// Renders the user message for `request` through the profile's template.
pub fn render_user_message(
    profile: &GeneratorProfile,
    request: &GeneratorRequest,
) -> Result<String> {
    let env = Environment::new();
    env.render_str(
        &profile.prompt_template,
        context! {
            request => request.user_text,
            board => request.board_context,
            history => request.history,
        },
    )
    .map_err(|e| {
        BrainstormError::internal(format!("Failed to render {} prompt: {}", profile.role, e))
    })
}
