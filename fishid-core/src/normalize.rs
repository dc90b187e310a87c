use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

use crate::types::ClassificationResult;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("response body is not JSON: {0}")]
    NotJson(String),

    #[error("response body is not a JSON object")]
    NotAnObject,
}

/// Top-level fields of a classification response, as sent by the service.
///
/// `description` is the primary text field. It usually carries a (possibly fenced) JSON
/// document; `fish_name` and `fish_type` are only consulted on the fallback path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fish_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fish_type: Option<String>,
}

impl RawPayload {
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_fish_name(mut self, fish_name: impl Into<String>) -> Self {
        self.fish_name = Some(fish_name.into());
        self
    }
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```json|```").expect("valid fence regex"))
}

/// Removes every markdown fence token, then trims.
pub fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "").trim().to_string()
}

/// Decodes a response body. Anything but a JSON object is unusable.
pub fn decode_payload(body: &[u8]) -> Result<RawPayload, NormalizeError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| NormalizeError::NotJson(e.to_string()))?;
    if !value.is_object() {
        return Err(NormalizeError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|e| NormalizeError::NotJson(e.to_string()))
}

/// Converts a payload into the canonical result. Never fails: text that is not structured
/// data takes the fallback path.
pub fn normalize(payload: &RawPayload) -> ClassificationResult {
    let stripped = strip_code_fences(payload.description.as_deref().unwrap_or_default());

    if let Some(fields) = parse_structured(&stripped) {
        return ClassificationResult::from_parts(
            field_text(&fields, "fish_type"),
            field_text(&fields, "description"),
            field_text(&fields, "habitat"),
            field_text(&fields, "edibility"),
        );
    }

    log::debug!("classification text is not structured data; using fallback fields");

    let fish_type = payload
        .fish_name
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| payload.fish_type.clone());

    ClassificationResult::from_parts(fish_type, payload.description.clone(), None, None)
}

pub fn normalize_body(body: &[u8]) -> Result<ClassificationResult, NormalizeError> {
    decode_payload(body).map(|p| normalize(&p))
}

fn parse_structured(text: &str) -> Option<Map<String, Value>> {
    if text.is_empty() {
        return None;
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Some(map);
    }

    // Models sometimes wrap the object in prose; try the outermost brace span.
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn field_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).cloned().and_then(value_text)
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected(fish_type: &str, description: &str, habitat: &str, edibility: &str) -> ClassificationResult {
        ClassificationResult {
            fish_type: fish_type.into(),
            description: description.into(),
            habitat: habitat.into(),
            edibility: edibility.into(),
        }
    }

    #[test]
    fn fenced_json_is_used_directly() {
        let payload = RawPayload::default().with_description(
            "```json\n{\"fish_type\":\"Tuna\",\"description\":\"x\",\"habitat\":\"ocean\",\"edibility\":\"edible\"}\n```",
        );
        assert_eq!(normalize(&payload), expected("Tuna", "x", "ocean", "edible"));
    }

    #[test]
    fn unfenced_json_is_used_directly() {
        let payload = RawPayload::default()
            .with_description(r#"{"fish_type":"Hilsa","description":"silver","habitat":"river","edibility":"edible"}"#);
        assert_eq!(normalize(&payload), expected("Hilsa", "silver", "river", "edible"));
    }

    #[test]
    fn prose_falls_back_to_fish_name() {
        let payload = RawPayload::default()
            .with_description("This looks like a tuna.")
            .with_fish_name("Tuna");
        assert_eq!(
            normalize(&payload),
            expected("Tuna", "This looks like a tuna.", "Unknown", "Unknown")
        );
    }

    #[test]
    fn empty_payload_normalizes_to_defaults() {
        assert_eq!(
            normalize(&RawPayload::default()),
            expected("Unknown", "N/A", "Unknown", "Unknown")
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let payload = RawPayload::default()
            .with_description("```json\n{\"fish_type\":\"Carp\"}\n```")
            .with_fish_name("ignored");
        let first = normalize(&payload);
        let second = normalize(&payload);
        assert_eq!(first, second);
        assert_eq!(first, expected("Carp", "N/A", "Unknown", "Unknown"));
    }

    #[test]
    fn broken_fenced_json_keeps_raw_text_as_description() {
        let raw = "```json\n{\"fish_type\": \"Tuna\",\n```";
        let payload = RawPayload::default().with_description(raw).with_fish_name("Tuna");
        let r = normalize(&payload);
        assert_eq!(r.fish_type, "Tuna");
        assert_eq!(r.description, raw);
        assert_eq!(r.habitat, "Unknown");
    }

    #[test]
    fn object_embedded_in_prose_is_recovered() {
        let payload = RawPayload::default().with_description(
            "Sure! Here you go: {\"fish_type\":\"Pomfret\",\"habitat\":\"coastal\"} Hope it helps.",
        );
        assert_eq!(normalize(&payload), expected("Pomfret", "N/A", "coastal", "Unknown"));
    }

    #[test]
    fn fallback_uses_top_level_fish_type_when_name_missing() {
        let body = br#"{"fish_type":"Mackerel","description":"Probably a mackerel."}"#;
        let r = normalize_body(body).unwrap();
        assert_eq!(r.fish_type, "Mackerel");
        assert_eq!(r.description, "Probably a mackerel.");
    }

    #[test]
    fn non_string_values_are_rendered_as_json_text() {
        let payload = RawPayload::default()
            .with_description(r#"{"fish_type":"Tuna","habitat":["ocean","reef"],"edibility":null}"#);
        let r = normalize(&payload);
        assert_eq!(r.habitat, r#"["ocean","reef"]"#);
        assert_eq!(r.edibility, "Unknown");
    }

    #[test]
    fn structured_description_object_is_accepted() {
        let body = br#"{"description":{"fish_type":"Tilapia","edibility":"edible"}}"#;
        let r = normalize_body(body).unwrap();
        assert_eq!(r, expected("Tilapia", "N/A", "Unknown", "edible"));
    }

    #[test]
    fn object_without_known_fields_normalizes_to_defaults() {
        assert_eq!(
            normalize_body(br#"{"status":"ok"}"#).unwrap(),
            expected("Unknown", "N/A", "Unknown", "Unknown")
        );
    }

    #[test]
    fn non_object_bodies_are_malformed() {
        assert_eq!(normalize_body(b"[1,2]"), Err(NormalizeError::NotAnObject));
        assert!(matches!(
            normalize_body(b"<html>502</html>"),
            Err(NormalizeError::NotJson(_))
        ));
    }

    #[test]
    fn strip_removes_all_fence_tokens() {
        assert_eq!(strip_code_fences("  ```json\n{}\n```  ```"), "{}");
        assert_eq!(strip_code_fences("plain"), "plain");
    }
}
