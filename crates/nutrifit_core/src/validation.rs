//! crates/nutrifit_core/src/validation.rs
//!
//! Advisory schema check for extracted report objects. Only top-level key presence
//! is checked; a `null` value counts as present.

use serde_json::{Map, Value};

/// Keys the report object must carry at the top level.
pub const REQUIRED_KEYS: [&str; 3] = ["transcript", "summary", "personalized_nutrition"];

/// Marker key added to objects that fail validation.
pub const WARNING_KEY: &str = "_warning";

pub const MISSING_KEYS_WARNING: &str = "Missing expected keys in JSON";

pub fn has_required_keys(object: &Map<String, Value>) -> bool {
    REQUIRED_KEYS.iter().all(|key| object.contains_key(*key))
}

/// Lists the required keys absent from `object`, in declaration order.
pub fn missing_keys(object: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_KEYS
        .iter()
        .copied()
        .filter(|key| !object.contains_key(*key))
        .collect()
}

/// Validates `object` and, when keys are missing, adds the warning marker instead
/// of rejecting it. Returns the validation result.
pub fn annotate_missing_keys(object: &mut Map<String, Value>) -> bool {
    if has_required_keys(object) {
        return true;
    }
    object.insert(
        WARNING_KEY.to_string(),
        Value::String(MISSING_KEYS_WARNING.to_string()),
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn null_values_count_as_present() {
        let report = object(json!({
            "transcript": null,
            "summary": null,
            "personalized_nutrition": null
        }));
        assert!(has_required_keys(&report));
    }

    #[test]
    fn nested_structure_is_not_inspected() {
        let report = object(json!({
            "transcript": 42,
            "summary": ["not", "text"],
            "personalized_nutrition": "anything"
        }));
        assert!(has_required_keys(&report));
    }

    #[test]
    fn missing_keys_are_listed_in_order() {
        let report = object(json!({"summary": "ok"}));
        assert_eq!(missing_keys(&report), vec!["transcript", "personalized_nutrition"]);
    }

    #[test]
    fn failing_object_is_annotated_not_rejected() {
        let mut report = object(json!({"transcript": "hi"}));

        assert!(!annotate_missing_keys(&mut report));
        assert_eq!(report["transcript"], json!("hi"));
        assert_eq!(report[WARNING_KEY], json!(MISSING_KEYS_WARNING));
    }

    #[test]
    fn valid_object_is_left_untouched() {
        let mut report = object(json!({
            "transcript": "hi",
            "summary": "ok",
            "personalized_nutrition": {}
        }));
        let before = report.clone();

        assert!(annotate_missing_keys(&mut report));
        assert_eq!(report, before);
    }
}
