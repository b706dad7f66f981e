//! Plan validation and step-name normalization.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use wayline_core::{ActionKind, Plan, PlanStep, Result, WaylineError};

/// Keys accepted for the step sequence, in lookup order.
const STEP_LIST_KEYS: [&str; 2] = ["steps", "plan"];

/// Keys accepted for a step's capability name, in lookup order.
const STEP_NAME_KEYS: [&str; 4] = ["name", "action", "kind", "type"];

/// Keys accepted for a step's query, in lookup order.
const STEP_QUERY_KEYS: [&str; 2] = ["query", "instruction"];

const OBSERVE_MARKERS: [&str; 4] = ["ensure", "verify", "check", "confirm"];

const ACT_MARKERS: [&str; 9] = [
    "click", "type", "press", "navigate", "open", "select", "submit", "scroll", "hover",
];

const EXTRACT_MARKERS: [&str; 7] = ["read", "get", "scrape", "capture", "grab", "copy", "extract"];

lazy_static! {
    static ref FENCED_BLOCK: Regex =
        Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").expect("valid regex");
}

/// Map a step name onto a capability kind.
///
/// Case-insensitive; the first matching rule wins:
/// 1. a canonical kind name,
/// 2. a `wait` prefix or a verification word (observe),
/// 3. an interaction word (act),
/// 4. a reading word (extract).
pub fn normalize_name(name: &str) -> Option<ActionKind> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }

    if let Ok(kind) = name.parse::<ActionKind>() {
        return Some(kind);
    }

    if name.starts_with("wait") || OBSERVE_MARKERS.iter().any(|m| name.contains(m)) {
        return Some(ActionKind::Observe);
    }

    if ACT_MARKERS.iter().any(|m| name.contains(m)) {
        return Some(ActionKind::Act);
    }

    if EXTRACT_MARKERS.iter().any(|m| name.contains(m)) {
        return Some(ActionKind::Extract);
    }

    None
}

/// Validate a raw plan object and build a [`Plan`].
pub fn validate(raw: &Value) -> Result<Plan> {
    let object = raw.as_object().ok_or_else(|| WaylineError::InvalidPlanShape {
        message: format!("expected a JSON object, got {}", json_type(raw)),
    })?;

    let items = STEP_LIST_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .ok_or_else(|| WaylineError::InvalidPlanShape {
            message: "missing \"steps\" array".to_string(),
        })?;

    let steps = items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_step(index, item))
        .collect::<Result<Vec<_>>>()?;

    Ok(Plan::new(steps))
}

fn validate_step(index: usize, item: &Value) -> Result<PlanStep> {
    let object = item.as_object().ok_or_else(|| {
        WaylineError::invalid_step(index, format!("expected an object, got {}", json_type(item)))
    })?;

    let name = STEP_NAME_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .ok_or_else(|| WaylineError::invalid_step(index, "missing step name"))?;

    let kind = normalize_name(name).ok_or_else(|| {
        WaylineError::invalid_step(index, format!("unrecognized step name \"{}\"", name))
    })?;

    let query = STEP_QUERY_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or_default();

    PlanStep::new(kind, query)
        .map_err(|_| WaylineError::invalid_step(index, "query must be a non-empty string"))
}

/// Try to read a plan object out of free-form model text.
///
/// The whole text is tried first, then the first fenced code block. Only
/// JSON objects count.
pub fn parse_plan_text(text: &str) -> Option<Value> {
    parse_object(text.trim()).or_else(|| {
        FENCED_BLOCK
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|body| parse_object(body.as_str().trim()))
    })
}

/// Decode tool arguments that may arrive as a JSON-encoded string.
pub fn decode_arguments(arguments: &Value) -> Result<Value> {
    match arguments {
        Value::String(encoded) => {
            serde_json::from_str(encoded).map_err(|e| WaylineError::InvalidPlanShape {
                message: format!("arguments are not valid JSON: {}", e),
            })
        }
        other => Ok(other.clone()),
    }
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
