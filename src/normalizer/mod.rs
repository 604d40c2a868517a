//! Turns whatever the host transport delivers into a typed result.
//!
//! The reply envelope is not fixed: it may be plain text, fenced JSON, JSON
//! nested under wrapper keys, or an array of any of those. Extraction runs
//! from strict to lenient and every descent is depth-bounded.

pub mod extract;
pub mod text;

use serde_json::Value;

use crate::models::{RequestMode, ResultPayload, StandardResult};

pub use extract::{extract_structured, MAX_UNWRAP_DEPTH, WRAPPER_KEYS};
pub use text::{extract_text, find_text, hotdog_from_text, strip_code_fences, verdict_from_text};

/// Normalizes one inbound value under the mode of the request it answers.
/// `None` means the value is noise for that mode.
pub fn normalize(value: &Value, mode: RequestMode) -> Option<ResultPayload> {
    if let Some(payload) = extract_structured(value, mode) {
        return Some(payload);
    }

    match mode {
        RequestMode::HotDog => find_text(value, hotdog_from_text).map(ResultPayload::HotDog),
        RequestMode::Standard => {
            let description = match extract_text(value) {
                Some(text) => text,
                None if text::exceeds_unwrap_depth(value) => return None,
                None => text::stringify(value)?,
            };
            Some(ResultPayload::Standard(StandardResult {
                description,
                ..StandardResult::default()
            }))
        }
    }
}

/// Raw transport strings become JSON when they parse, text otherwise.
pub fn parse_raw(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
}
