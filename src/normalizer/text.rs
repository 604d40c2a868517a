use serde_json::Value;

use crate::models::HotDogResult;

use super::extract::{MAX_UNWRAP_DEPTH, WRAPPER_KEYS};

/// Longest reply that is shown verbatim as a hot-dog reason.
pub const MAX_REASON_CHARS: usize = 200;
pub const REASON_PLACEHOLDER: &str = "The verdict came with a long explanation.";

const FENCE: &str = "```";

/// Returns the body of the first fenced block, or the trimmed input when
/// there is no fence. An unterminated fence yields everything after it.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + FENCE.len()..];
    // Skip an info string such as `json` on the opening line.
    let body_start = match after_open.find('\n') {
        Some(newline) if is_info_string(&after_open[..newline]) => newline + 1,
        _ => 0,
    };
    let body = &after_open[body_start..];

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn is_info_string(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+'))
}

/// Parses JSON embedded in free text. Only containers and double-encoded
/// strings count; a bare `true` or `42` is left to the text fallbacks.
pub fn parse_embedded_json(text: &str) -> Option<Value> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return None;
    }

    if body.starts_with(|c: char| matches!(c, '{' | '[' | '"')) {
        if let Ok(value) = serde_json::from_str::<Value>(body) {
            return keep_structured(value);
        }
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<Value>(&body[start..=end])
        .ok()
        .and_then(keep_structured)
}

fn keep_structured(value: Value) -> Option<Value> {
    match value {
        Value::Object(_) | Value::Array(_) | Value::String(_) => Some(value),
        _ => None,
    }
}

/// Pulls the first piece of plain text out of an inbound value, following the
/// same wrapper keys and depth bound as structured extraction.
pub fn extract_text(value: &Value) -> Option<String> {
    find_text(value, non_empty)
}

/// Walks every reachable text leaf in wrapper-key order and returns the first
/// one `accept` maps to `Some`.
pub fn find_text<T>(value: &Value, accept: impl Fn(&str) -> Option<T>) -> Option<T> {
    find_text_at(value, 0, &accept)
}

fn find_text_at<T>(value: &Value, depth: usize, accept: &impl Fn(&str) -> Option<T>) -> Option<T> {
    if depth > MAX_UNWRAP_DEPTH {
        return None;
    }

    match value {
        Value::String(raw) => parse_embedded_json(raw)
            .and_then(|parsed| find_text_at(&parsed, depth + 1, accept))
            .or_else(|| accept(strip_code_fences(raw))),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|inner| find_text_at(inner, depth + 1, accept)),
        Value::Array(items) => items
            .iter()
            .find_map(|item| find_text_at(item, depth + 1, accept)),
        _ => None,
    }
}

/// True when some wrapper path runs deeper than the unwrap bound.
pub fn exceeds_unwrap_depth(value: &Value) -> bool {
    exceeds_at(value, 0)
}

fn exceeds_at(value: &Value, depth: usize) -> bool {
    if depth > MAX_UNWRAP_DEPTH {
        return true;
    }

    match value {
        Value::String(raw) => {
            parse_embedded_json(raw).is_some_and(|parsed| exceeds_at(&parsed, depth + 1))
        }
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .any(|inner| exceeds_at(inner, depth + 1)),
        Value::Array(items) => items.iter().any(|item| exceeds_at(item, depth + 1)),
        _ => false,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `Some(false)` for "NOT HOT DOG", `Some(true)` for any other "HOT DOG",
/// `None` when neither appears. Case-insensitive.
pub fn verdict_from_text(text: &str) -> Option<bool> {
    let upper = text.to_uppercase();
    if upper.contains("NOT HOT DOG") {
        Some(false)
    } else if upper.contains("HOT DOG") {
        Some(true)
    } else {
        None
    }
}

pub fn hotdog_from_text(text: &str) -> Option<HotDogResult> {
    let is_hot_dog = verdict_from_text(text)?;
    let reason = if text.chars().count() <= MAX_REASON_CHARS {
        text.to_string()
    } else {
        REASON_PLACEHOLDER.to_string()
    };

    Some(HotDogResult { is_hot_dog, reason })
}

/// Last resort for standard mode: the whole value as text.
pub fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(raw) => non_empty(raw),
        Value::Object(map) if map.is_empty() => None,
        Value::Array(items) if items.is_empty() => None,
        other => serde_json::to_string(other).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_fenced_json_with_language_tag() {
        let raw = "```json\n{\"name\":\"Mug\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"name\":\"Mug\"}");
    }

    #[test]
    fn strips_fence_embedded_in_prose() {
        let raw = "Sure! Here it is:\n```\n{\"a\":1}\n```\nHope that helps.";
        assert_eq!(strip_code_fences(raw), "{\"a\":1}");
    }

    #[test]
    fn inline_fence_without_newline() {
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn compact_json_on_fence_line_is_not_a_language_tag() {
        assert_eq!(strip_code_fences("```{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn recovers_object_from_surrounding_prose() {
        let parsed = parse_embedded_json("The answer is {\"name\": \"Lamp\"} I think").unwrap();
        assert_eq!(parsed, json!({"name": "Lamp"}));
    }

    #[test]
    fn bare_scalars_are_not_structured() {
        assert!(parse_embedded_json("true").is_none());
        assert!(parse_embedded_json("42").is_none());
        assert!(parse_embedded_json("just words").is_none());
    }

    #[test]
    fn text_follows_wrappers_and_arrays() {
        let value = json!({"data": [{"ignored": 1}, {"message": "A red apple."}]});
        assert_eq!(extract_text(&value).as_deref(), Some("A red apple."));
    }

    #[test]
    fn finds_later_leaf_when_first_does_not_match() {
        let value = json!({"data": "Processing", "message": "NOT HOT DOG, a shoe"});
        assert_eq!(extract_text(&value).as_deref(), Some("Processing"));
        assert_eq!(find_text(&value, verdict_from_text), Some(false));
    }

    #[test]
    fn depth_bound_is_detected() {
        let mut deep = json!("bottom");
        for _ in 0..6 {
            deep = json!({ "data": deep });
        }
        assert!(exceeds_unwrap_depth(&deep));
        assert!(!exceeds_unwrap_depth(&json!({"data": {"message": "shallow"}})));
        assert!(!exceeds_unwrap_depth(&json!({"status": 200})));
    }

    #[test]
    fn verdict_prefers_negative_match() {
        assert_eq!(verdict_from_text("definitely a hot dog"), Some(true));
        assert_eq!(verdict_from_text("Verdict: NOT HOT DOG, sorry"), Some(false));
        assert_eq!(verdict_from_text("a sandwich"), None);
    }

    #[test]
    fn long_reason_uses_placeholder() {
        let long = format!("HOT DOG {}", "x".repeat(250));
        let result = hotdog_from_text(&long).unwrap();
        assert!(result.is_hot_dog);
        assert_eq!(result.reason, REASON_PLACEHOLDER);
    }

    #[test]
    fn stringify_skips_empty_values() {
        assert!(stringify(&Value::Null).is_none());
        assert!(stringify(&json!({})).is_none());
        assert!(stringify(&json!("   ")).is_none());
        assert_eq!(stringify(&json!({"x": 1})).as_deref(), Some("{\"x\":1}"));
    }
}
