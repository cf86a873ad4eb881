//! Per-field coercions for loosely typed assistant output.
//!
//! Each function dispatches on the JSON runtime shape and is total over its
//! input: intensity is the only field whose coercion can come back empty,
//! and the caller turns that into a rejection.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::models::{GeneralFlag, Medication};

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").unwrap());

const TRUTHY_TOKENS: &[&str] = &["yes", "true", "y"];

const MEDICATION_NAME_KEYS: &[&str] = &["name", "medication", "medication_name", "drug"];
const MEDICATION_DOSE_KEYS: &[&str] = &["dose", "dosage"];
const MEDICATION_EFFECT_KEYS: &[&str] = &["effectiveness", "effect", "relief", "helped"];

/// First alias whose value is present and not null.
pub fn first_present<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key).filter(|v| !v.is_null()))
}

/// Numbers pass through; strings keep their first numeric run (`"7/10"` → 7),
/// falling back to 0 when there is none. Absent, null and structured values
/// are not coercible.
pub fn coerce_intensity(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => Some(
            LEADING_NUMBER
                .find(s)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|f| f.is_finite())
                .unwrap_or(0.0),
        ),
        _ => None,
    }
}

/// Arrays keep their string items; a comma-separated string is split.
pub fn coerce_types(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Render any JSON value as display text; null and absent become empty.
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn is_truthy_token(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    TRUTHY_TOKENS.contains(&lowered.as_str())
}

/// Fold the boolean, string and object shapes into one `Medication`.
pub fn coerce_medication(value: Option<&Value>) -> Medication {
    match value {
        Some(Value::Bool(taking)) => Medication {
            taking: *taking,
            ..Medication::default()
        },
        Some(Value::String(s)) => Medication {
            taking: is_truthy_token(s),
            ..Medication::default()
        },
        Some(Value::Object(obj)) => Medication {
            taking: match obj.get("taking") {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => is_truthy_token(s),
                _ => false,
            },
            name: coerce_text(first_present(obj, MEDICATION_NAME_KEYS)),
            dose: coerce_text(first_present(obj, MEDICATION_DOSE_KEYS)),
            effectiveness: coerce_text(first_present(obj, MEDICATION_EFFECT_KEYS)),
        },
        _ => Medication::not_taking(),
    }
}

/// `"emergency"` in any case, or any non-zero number, marks an emergency.
pub fn coerce_general_flag(value: Option<&Value>) -> GeneralFlag {
    match value {
        Some(Value::String(s)) if s.trim().eq_ignore_ascii_case("emergency") => {
            GeneralFlag::Emergency
        }
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0) => GeneralFlag::Emergency,
        _ => GeneralFlag::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intensity_number_passes_through() {
        assert_eq!(coerce_intensity(Some(&json!(5))), Some(5.0));
        assert_eq!(coerce_intensity(Some(&json!(6.5))), Some(6.5));
    }

    #[test]
    fn intensity_string_strips_suffix() {
        assert_eq!(coerce_intensity(Some(&json!("7/10"))), Some(7.0));
        assert_eq!(coerce_intensity(Some(&json!("about 4.5"))), Some(4.5));
        assert_eq!(coerce_intensity(Some(&json!(" 8 "))), Some(8.0));
    }

    #[test]
    fn intensity_non_numeric_string_defaults_to_zero() {
        assert_eq!(coerce_intensity(Some(&json!("severe"))), Some(0.0));
        assert_eq!(coerce_intensity(Some(&json!(""))), Some(0.0));
    }

    #[test]
    fn intensity_absent_or_null_is_not_coercible() {
        assert_eq!(coerce_intensity(None), None);
        assert_eq!(coerce_intensity(Some(&Value::Null)), None);
        assert_eq!(coerce_intensity(Some(&json!({"v": 3}))), None);
    }

    #[test]
    fn types_from_array_and_comma_string() {
        assert_eq!(
            coerce_types(Some(&json!(["sharp", "burning"]))),
            vec!["sharp", "burning"]
        );
        assert_eq!(
            coerce_types(Some(&json!(" sharp, ,dull ,"))),
            vec!["sharp", "dull"]
        );
        assert!(coerce_types(Some(&json!(3))).is_empty());
        assert!(coerce_types(None).is_empty());
    }

    #[test]
    fn medication_coercion_is_total() {
        let inputs = [
            Some(json!(true)),
            Some(json!("Yes")),
            Some(json!({"taking": "y", "name": "Ibuprofen", "dose": 400})),
            None,
            Some(Value::Null),
            Some(json!(12)),
        ];
        for input in &inputs {
            let med = coerce_medication(input.as_ref());
            // Every shape lands in the fixed four-field form.
            let json = serde_json::to_value(&med).unwrap();
            assert!(json["taking"].is_boolean());
            assert!(json["name"].is_string());
            assert!(json["dose"].is_string());
            assert!(json["effectiveness"].is_string());
        }
    }

    #[test]
    fn medication_boolean_shape() {
        let med = coerce_medication(Some(&json!(true)));
        assert!(med.taking);
        assert!(med.name.is_empty());
    }

    #[test]
    fn medication_string_shape() {
        assert!(coerce_medication(Some(&json!("TRUE"))).taking);
        assert!(!coerce_medication(Some(&json!("no"))).taking);
    }

    #[test]
    fn medication_object_reads_legacy_keys() {
        let med = coerce_medication(Some(&json!({
            "taking": true,
            "medication": "Paracetamol",
            "dosage": 500,
            "relief": "some"
        })));
        assert_eq!(
            med,
            Medication {
                taking: true,
                name: "Paracetamol".into(),
                dose: "500".into(),
                effectiveness: "some".into(),
            }
        );
    }

    #[test]
    fn medication_object_prefers_canonical_keys() {
        let med = coerce_medication(Some(&json!({
            "taking": "no",
            "name": "Ibuprofen",
            "medication": "ignored"
        })));
        assert!(!med.taking);
        assert_eq!(med.name, "Ibuprofen");
    }

    #[test]
    fn general_flag_mappings() {
        assert_eq!(coerce_general_flag(Some(&json!("emergency"))), GeneralFlag::Emergency);
        assert_eq!(coerce_general_flag(Some(&json!("Emergency"))), GeneralFlag::Emergency);
        assert_eq!(coerce_general_flag(Some(&json!("EMERGENCY"))), GeneralFlag::Emergency);
        assert_eq!(coerce_general_flag(Some(&json!("okay"))), GeneralFlag::Normal);
        assert_eq!(coerce_general_flag(Some(&json!(1))), GeneralFlag::Emergency);
        assert_eq!(coerce_general_flag(Some(&json!(0))), GeneralFlag::Normal);
        assert_eq!(coerce_general_flag(Some(&json!(true))), GeneralFlag::Normal);
        assert_eq!(coerce_general_flag(None), GeneralFlag::Normal);
    }

    #[test]
    fn text_coercion_shapes() {
        assert_eq!(coerce_text(Some(&json!(2.5))), "2.5");
        assert_eq!(coerce_text(Some(&json!(false))), "false");
        assert_eq!(coerce_text(Some(&Value::Null)), "");
        assert_eq!(coerce_text(Some(&json!(["a"]))), r#"["a"]"#);
    }
}
