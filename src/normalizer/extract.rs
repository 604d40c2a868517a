use serde_json::{Map, Value};

use crate::models::{HotDogResult, RequestMode, ResultPayload, StandardResult, UNKNOWN_NAME};

use super::text::{parse_embedded_json, verdict_from_text};

/// Levels of unwrapping allowed below the top-level value (which is depth 0).
/// Every wrapper key, array element and embedded JSON string costs one level.
pub const MAX_UNWRAP_DEPTH: usize = 5;

/// Conventional envelope keys the real payload may hide under, tried in order.
pub const WRAPPER_KEYS: &[&str] = &[
    "data", "message", "response", "payload", "content", "body", "output", "result", "text",
];

const STANDARD_FIELDS: &[&str] = &["name", "category", "description", "fun_fact", "funFact"];
const HOTDOG_FIELDS: &[&str] = &["result", "reason", "verdict", "is_hot_dog", "hotdog"];

/// Finds the first object that carries a result field for `mode` and builds
/// the typed payload from it.
pub fn extract_structured(value: &Value, mode: RequestMode) -> Option<ResultPayload> {
    extract_at(value, mode, 0)
}

fn extract_at(value: &Value, mode: RequestMode, depth: usize) -> Option<ResultPayload> {
    if depth > MAX_UNWRAP_DEPTH {
        return None;
    }

    match value {
        Value::Object(map) => {
            if let Some(payload) = extract_embedded_verdict(map, mode, depth) {
                return Some(payload);
            }
            if has_result_field(map, mode) {
                return Some(build_payload(map, mode));
            }
            WRAPPER_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(|inner| extract_at(inner, mode, depth + 1))
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| extract_at(item, mode, depth + 1)),
        Value::String(raw) => {
            parse_embedded_json(raw).and_then(|parsed| extract_at(&parsed, mode, depth + 1))
        }
        _ => None,
    }
}

/// Verdict fields that may hold the whole answer as a JSON string, as in
/// `{"result": "{\"result\": \"HOT DOG\", \"reason\": ...}"}`.
const EMBEDDING_FIELDS: &[&str] = &["result", "verdict"];

fn extract_embedded_verdict(
    map: &Map<String, Value>,
    mode: RequestMode,
    depth: usize,
) -> Option<ResultPayload> {
    if !matches!(mode, RequestMode::HotDog) {
        return None;
    }

    EMBEDDING_FIELDS
        .iter()
        .filter_map(|key| map.get(*key)?.as_str())
        .filter_map(parse_embedded_json)
        .filter(|parsed| parsed.is_object() || parsed.is_array())
        .find_map(|parsed| extract_at(&parsed, mode, depth + 1))
}

fn expected_fields(mode: RequestMode) -> &'static [&'static str] {
    match mode {
        RequestMode::Standard => STANDARD_FIELDS,
        RequestMode::HotDog => HOTDOG_FIELDS,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn has_result_field(map: &Map<String, Value>, mode: RequestMode) -> bool {
    expected_fields(mode)
        .iter()
        .any(|key| map.get(*key).is_some_and(is_scalar))
}

fn field_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    })
}

fn field_bool(map: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| map.get(*key)?.as_bool())
}

fn build_payload(map: &Map<String, Value>, mode: RequestMode) -> ResultPayload {
    match mode {
        RequestMode::Standard => ResultPayload::Standard(build_standard(map)),
        RequestMode::HotDog => ResultPayload::HotDog(build_hotdog(map)),
    }
}

fn build_standard(map: &Map<String, Value>) -> StandardResult {
    StandardResult {
        name: field_text(map, &["name"])
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        category: field_text(map, &["category"]).unwrap_or_default(),
        description: field_text(map, &["description"]).unwrap_or_default(),
        fun_fact: field_text(map, &["fun_fact", "funFact"]).unwrap_or_default(),
    }
}

fn build_hotdog(map: &Map<String, Value>) -> HotDogResult {
    let reason = field_text(map, &["reason"]).unwrap_or_default();

    let is_hot_dog = field_bool(map, &["is_hot_dog", "hotdog", "verdict"])
        .or_else(|| {
            field_text(map, &["result", "verdict"])
                .as_deref()
                .and_then(verdict_from_text)
        })
        .or_else(|| verdict_from_text(&reason))
        .unwrap_or(false);

    HotDogResult { is_hot_dog, reason }
}
