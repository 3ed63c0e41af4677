//! Tolerant parsing of generator output into a `{reply, elements}` response.
//!
//! Generator output is untrusted: it may already be structured, may be a JSON
//! object encoded once or several times as a string, a bare array of element
//! records, a `name([...])` pseudo function call, or plain prose. Each shape is
//! handled by one named [`RepairStrategy`]; the pipeline runs them in order and
//! the first one that succeeds wins. If none does, the input becomes the reply
//! and the element list is empty.

use crate::generator::RawOutput;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reply used when the generator only produced an element array.
pub const ARRAY_REPLY: &str = "Here are the requested diagram elements.";

/// Bound on string-within-a-string unwrapping.
const MAX_UNWRAP_DEPTH: usize = 8;

static FUNCTION_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*[A-Za-z_][A-Za-z0-9_.]*\s*\(\s*(\[.*\])\s*\)\s*;?\s*$")
        .expect("function call pattern is valid")
});

/// Normalized generator response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairedResponse {
    pub reply: String,
    /// Element-like records, not yet validated.
    pub elements: Vec<Value>,
}

impl RepairedResponse {
    fn from_array(elements: Vec<Value>) -> Self {
        Self {
            reply: ARRAY_REPLY.to_string(),
            elements,
        }
    }

    fn fail_soft(text: String) -> Self {
        Self {
            reply: text,
            elements: Vec::new(),
        }
    }

    /// Reads `reply` and `elements` out of an object, tolerating odd types.
    fn from_object(object: &Map<String, Value>) -> Self {
        let reply = match object.get("reply") {
            Some(Value::String(reply)) => reply.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let elements = match object.get("elements") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(single)) => vec![Value::Object(single.clone())],
            _ => Vec::new(),
        };
        Self { reply, elements }
    }
}

/// The ordered repair strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStrategy {
    /// Already structured data.
    Passthrough,
    /// `name([...])` wrapper around an element array.
    FunctionCallArray,
    /// Text that is a bare JSON array.
    BareArray,
    /// A (possibly multiply encoded) JSON object, possibly surrounded by noise.
    EmbeddedObject,
}

impl RepairStrategy {
    pub const PIPELINE: [RepairStrategy; 4] = [
        RepairStrategy::Passthrough,
        RepairStrategy::FunctionCallArray,
        RepairStrategy::BareArray,
        RepairStrategy::EmbeddedObject,
    ];

    /// Attempts this strategy alone.
    pub fn apply(&self, raw: &RawOutput) -> Option<RepairedResponse> {
        match (self, raw) {
            (RepairStrategy::Passthrough, RawOutput::Structured(value)) => passthrough(value),
            (RepairStrategy::Passthrough, RawOutput::Text(_)) => None,
            (strategy, raw) => {
                let text = raw.to_text();
                match strategy {
                    RepairStrategy::FunctionCallArray => function_call_array(&text),
                    RepairStrategy::BareArray => bare_array(&text),
                    RepairStrategy::EmbeddedObject => embedded_object(&text),
                    RepairStrategy::Passthrough => None,
                }
            }
        }
    }
}

/// Runs the repair pipeline. Never fails.
pub fn repair_response(raw: &RawOutput) -> RepairedResponse {
    for strategy in RepairStrategy::PIPELINE {
        if let Some(repaired) = strategy.apply(raw) {
            tracing::debug!(
                "[Repair] {:?} succeeded with {} element(s)",
                strategy,
                repaired.elements.len()
            );
            return repaired;
        }
    }

    let text = raw.to_text();
    tracing::warn!("[Repair] Could not coerce generator output, using it as the reply");
    RepairedResponse::fail_soft(text)
}

fn passthrough(value: &Value) -> Option<RepairedResponse> {
    match value {
        Value::Object(object) => Some(RepairedResponse::from_object(object)),
        Value::Array(items) => Some(RepairedResponse::from_array(items.clone())),
        _ => None,
    }
}

fn function_call_array(text: &str) -> Option<RepairedResponse> {
    let captures = FUNCTION_CALL.captures(text)?;
    let items: Vec<Value> = serde_json::from_str(captures.get(1)?.as_str()).ok()?;
    Some(RepairedResponse::from_array(items))
}

fn bare_array(text: &str) -> Option<RepairedResponse> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    let items: Vec<Value> = serde_json::from_str(trimmed).ok()?;
    Some(RepairedResponse::from_array(items))
}

fn embedded_object(text: &str) -> Option<RepairedResponse> {
    let cleaned = strip_noise(text);

    let value = unwrap_layers(cleaned).or_else(|| {
        let candidate = first_balanced_object(cleaned)?;
        unwrap_layers(candidate)
    })?;

    match value {
        Value::Object(object) => Some(RepairedResponse::from_object(&object)),
        _ => None,
    }
}

/// Trims whitespace, code fences and stray leading braces such as `{"{"reply"...`.
fn strip_noise(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```") {
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        cleaned = rest.trim_end().trim_end_matches("```").trim();
    }
    if cleaned.starts_with("{\"{") {
        if let Some(index) = cleaned.find("{\"reply\"") {
            cleaned = &cleaned[index..];
        }
    }
    cleaned
}

/// Parses `text` as JSON, then keeps parsing while the result is a string that
/// itself looks like encoded JSON.
fn unwrap_layers(text: &str) -> Option<Value> {
    let mut current: Value = serde_json::from_str(text.trim()).ok()?;
    for _ in 0..MAX_UNWRAP_DEPTH {
        let inner = match &current {
            Value::String(inner) if looks_encoded(inner) => inner.trim().to_string(),
            _ => return Some(current),
        };
        current = serde_json::from_str(&inner).ok()?;
    }
    Some(current)
}

fn looks_encoded(text: &str) -> bool {
    let text = text.trim_start();
    text.starts_with('{') || text.starts_with('"')
}

/// Returns the first `{...}` substring whose braces balance, ignoring braces
/// inside JSON string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
