//! Turns planner output into an ordered, non-empty list of step descriptions.
//!
//! The planner may answer with a `{"steps": [...]}` object, a bare array, an
//! object whose values are the steps, a numbered list in prose, or simply echo
//! the request back. Whatever arrives, the result is never empty and never
//! contains the request itself.

use crate::generator::RawOutput;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The step substituted whenever the planner gives nothing usable.
pub const GENERIC_STEP: &str = "break the request into components and connections";

const MAX_DECODE_DEPTH: usize = 4;

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[-*•]+|\d+[.)]|step\s*\d+\s*[:.)-])\s*")
        .expect("list marker pattern is valid")
});

/// An ordered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
}

impl Plan {
    pub fn generic() -> Self {
        Self {
            steps: vec![GENERIC_STEP.to_string()],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Extracts a plan for `request` from planner output.
pub fn extract_plan(raw: &RawOutput, request: &str) -> Plan {
    let candidates = match raw {
        RawOutput::Structured(value) => candidates_from_value(value, 0),
        RawOutput::Text(text) => candidates_from_text(text),
    };
    let plan = normalize(candidates, request);
    tracing::debug!("[PlanExtractor] Extracted {} step(s)", plan.len());
    plan
}

fn candidates_from_text(text: &str) -> Vec<String> {
    let cleaned = strip_code_fence(text.trim());
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => candidates_from_value(&value, 0),
        Err(_) => cleaned
            .lines()
            .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
    }
}

fn candidates_from_value(value: &Value, depth: usize) -> Vec<String> {
    match value {
        Value::Object(object) => match object.get("steps") {
            Some(steps) => candidates_from_value(steps, depth),
            None => object.values().flat_map(step_texts).collect(),
        },
        Value::Array(items) => items.iter().flat_map(step_texts).collect(),
        Value::String(text) if depth < MAX_DECODE_DEPTH => {
            let trimmed = text.trim();
            match serde_json::from_str::<Value>(trimmed) {
                Ok(inner @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => {
                    candidates_from_value(&inner, depth + 1)
                }
                _ => vec![trimmed.to_string()],
            }
        }
        other => step_texts(other),
    }
}

/// Flattens one plan entry into step strings.
fn step_texts(value: &Value) -> Vec<String> {
    match value {
        Value::String(text) => vec![text.trim().to_string()],
        Value::Number(number) => vec![number.to_string()],
        Value::Array(items) => items.iter().flat_map(step_texts).collect(),
        Value::Object(object) => ["step", "description", "text", "title", "name"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(|text| vec![text.trim().to_string()])
            .unwrap_or_else(|| object.values().flat_map(step_texts).collect()),
        Value::Null | Value::Bool(_) => Vec::new(),
    }
}

fn strip_code_fence(text: &str) -> &str {
    match text.strip_prefix("```") {
        Some(rest) => rest
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_end()
            .trim_end_matches("```")
            .trim(),
        None => text,
    }
}

fn normalize(candidates: Vec<String>, request: &str) -> Plan {
    let request = request.trim();
    let request_lower = request.to_lowercase();

    let candidates: Vec<String> = candidates.into_iter().filter(|c| !c.is_empty()).collect();

    if let [single] = candidates.as_slice() {
        if !request_lower.is_empty() && single.to_lowercase().contains(&request_lower) {
            tracing::warn!("[PlanExtractor] Planner echoed the request, using the generic step");
            return Plan::generic();
        }
    }

    let steps: Vec<String> = candidates
        .into_iter()
        .filter(|step| !is_echo(step, request, &request_lower))
        .collect();

    if steps.is_empty() {
        tracing::warn!("[PlanExtractor] No usable steps, using the generic step");
        return Plan::generic();
    }
    Plan { steps }
}

fn is_echo(step: &str, request: &str, request_lower: &str) -> bool {
    if request.is_empty() {
        return false;
    }
    step == request || step.to_lowercase().starts_with(request_lower)
}
