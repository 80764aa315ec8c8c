//! Write-boundary checks for raw medicine records.
//!
//! `validate` reports user-facing problems on the record as submitted; `sanitize`
//! coerces whatever was submitted into a storable shape. Run `validate` first:
//! `sanitize` fills missing required fields with empty values instead of rejecting them.

use crate::models::{is_valid_time, DoseTime};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const NAME_MAX_CHARS: usize = 100;
pub const DOSAGE_MAX_CHARS: usize = 100;
pub const TEXT_MAX_CHARS: usize = 500;
pub const DURATION_MAX_DAYS: f64 = 3650.0;
pub const REMIND_BEFORE_MAX: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// A record after coercion and truncation. Serialises back to the raw
/// camelCase shape, so sanitizing its JSON form yields the same value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedMedicine {
    pub name: String,
    pub times: Vec<DoseTime>,
    pub dosage: String,
    pub instructions: String,
    pub duration: Option<u32>,
    pub notes: String,
    pub side_effects: String,
    pub contraindications: String,
    pub tags: Vec<String>,
    pub refill_date: Option<NaiveDate>,
    pub refill_reminder: bool,
    pub remind_before: Option<u32>,
}

/// Returns one error per violated rule. An empty list means the record may be admitted.
pub fn validate(record: &Value) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let name = record.get("name").and_then(Value::as_str).map(str::trim).unwrap_or("");
    if name.is_empty() {
        errors.push(ValidationError::new("name", "Medicine name is required"));
    }

    let times = record.get("times").and_then(Value::as_array);
    if times.map_or(true, |t| t.is_empty()) {
        errors.push(ValidationError::new("times", "At least one time is required"));
    }
    let malformed = times
        .map(|t| t.iter().any(|entry| !entry.as_str().map_or(false, is_valid_time)))
        .unwrap_or(false);
    if malformed {
        errors.push(ValidationError::new("times", "Invalid time format"));
    }

    if let Some(dosage) = record.get("dosage").and_then(Value::as_str) {
        if dosage.chars().count() > DOSAGE_MAX_CHARS {
            errors.push(ValidationError::new("dosage", "Dosage description too long"));
        }
    }

    if let Some(duration) = record.get("duration").and_then(number_of) {
        if !(0.0..=DURATION_MAX_DAYS).contains(&duration) {
            errors.push(ValidationError::new(
                "duration",
                "Duration must be between 0 and 3650 days",
            ));
        }
    }

    if let Some(remind_before) = record.get("remindBefore").and_then(number_of) {
        if !(0.0..=REMIND_BEFORE_MAX).contains(&remind_before) {
            errors.push(ValidationError::new("remindBefore", "Reminder must be 0-24 before"));
        }
    }

    errors
}

/// Normalises a raw record. Total and idempotent: malformed fields degrade to
/// empty or unset values.
pub fn sanitize(record: &Value) -> SanitizedMedicine {
    SanitizedMedicine {
        name: text(record.get("name"), NAME_MAX_CHARS),
        times: string_list(record.get("times"))
            .filter_map(|t| t.parse::<DoseTime>().ok())
            .collect(),
        dosage: text(record.get("dosage"), DOSAGE_MAX_CHARS),
        instructions: text(record.get("instructions"), TEXT_MAX_CHARS),
        duration: whole_days(record.get("duration"), DURATION_MAX_DAYS),
        notes: text(record.get("notes"), TEXT_MAX_CHARS),
        side_effects: text(record.get("sideEffects"), TEXT_MAX_CHARS),
        contraindications: text(record.get("contraindications"), TEXT_MAX_CHARS),
        tags: string_list(record.get("tags")).filter(|t| !t.is_empty()).collect(),
        refill_date: record
            .get("refillDate")
            .and_then(Value::as_str)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()),
        refill_reminder: truthy(record.get("refillReminder")),
        remind_before: whole_days(record.get("remindBefore"), REMIND_BEFORE_MAX),
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

fn text(value: Option<&Value>, max_chars: usize) -> String {
    let raw = coerce_string(value);
    let truncated: String = raw.trim().chars().take(max_chars).collect();
    truncated.trim_end().to_string()
}

fn string_list(value: Option<&Value>) -> impl Iterator<Item = String> + '_ {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|entry| coerce_string(Some(entry)).trim().to_string())
}

fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Clamps into `[0, max]` and truncates to whole units; zero means unset.
fn whole_days(value: Option<&Value>, max: f64) -> Option<u32> {
    let days = value.and_then(number_of)?.clamp(0.0, max).trunc() as u32;
    if days == 0 {
        None
    } else {
        Some(days)
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[ValidationError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_valid_record_passes() {
        let record = json!({
            "name": "Lisinopril",
            "times": ["08:00", "20:00"],
            "dosage": "10mg",
            "duration": 90,
            "remindBefore": 2
        });
        assert!(validate(&record).is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = validate(&json!({ "name": "   ", "times": [] }));
        assert_eq!(fields(&errors), vec!["name", "times"]);
        assert_eq!(errors[0].message, "Medicine name is required");
        assert_eq!(errors[1].message, "At least one time is required");

        let errors = validate(&json!({}));
        assert_eq!(fields(&errors), vec!["name", "times"]);
    }

    #[test]
    fn test_each_rule_reports_once() {
        let record = json!({
            "name": "Aspirin",
            "times": ["8am", "09:00", 930],
            "dosage": "x".repeat(101),
            "duration": 4000,
            "remindBefore": 30
        });
        let errors = validate(&record);
        assert_eq!(fields(&errors), vec!["times", "dosage", "duration", "remindBefore"]);
        assert_eq!(errors[0].message, "Invalid time format");
    }

    #[test]
    fn test_validate_does_not_reject_boundaries() {
        let record = json!({
            "name": "Aspirin",
            "times": ["00:00", "23:59"],
            "dosage": "x".repeat(100),
            "duration": 3650,
            "remindBefore": 0
        });
        assert!(validate(&record).is_empty());
        assert!(!validate(&json!({ "name": "A", "times": ["24:00"] })).is_empty());
    }

    #[test]
    fn test_sanitize_truncates_and_filters() {
        let record = json!({
            "name": format!("  {}  ", "N".repeat(150)),
            "times": [" 08:00 ", "nope", "25:00", "20:00"],
            "dosage": 500,
            "instructions": "take with food ",
            "duration": "7",
            "sideEffects": "Nausea, Headache",
            "tags": ["  heart ", "", "   ", 12]
        });
        let clean = sanitize(&record);
        assert_eq!(clean.name.chars().count(), NAME_MAX_CHARS);
        assert_eq!(
            clean.times.iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            vec!["08:00", "20:00"]
        );
        assert_eq!(clean.dosage, "500");
        assert_eq!(clean.instructions, "take with food");
        assert_eq!(clean.duration, Some(7));
        assert_eq!(clean.side_effects, "Nausea, Headache");
        assert_eq!(clean.tags, vec!["heart", "12"]);
        assert_eq!(clean.notes, "");
    }

    #[test]
    fn test_non_ascii_digits_are_not_times() {
        let record = json!({ "name": "Aspirin", "times": ["0\u{0668}:30", "08:00"] });
        let errors = validate(&record);
        assert_eq!(fields(&errors), vec!["times"]);
        assert_eq!(errors[0].message, "Invalid time format");

        let clean = sanitize(&record);
        assert_eq!(clean.times.len(), 1);
        assert_eq!(clean.times[0].to_string(), "08:00");
    }

    #[test]
    fn test_sanitize_clamps_numbers() {
        assert_eq!(sanitize(&json!({ "duration": 99999 })).duration, Some(3650));
        assert_eq!(sanitize(&json!({ "duration": -5 })).duration, None);
        assert_eq!(sanitize(&json!({ "duration": 0 })).duration, None);
        assert_eq!(sanitize(&json!({ "duration": "abc" })).duration, None);
        assert_eq!(sanitize(&json!({ "remindBefore": 48 })).remind_before, Some(24));
        assert_eq!(sanitize(&json!({ "remindBefore": 2.9 })).remind_before, Some(2));
    }

    #[test]
    fn test_sanitize_never_fails() {
        for raw in [json!(null), json!([1, 2]), json!("text"), json!({ "times": "08:00" })] {
            let clean = sanitize(&raw);
            assert!(clean.name.is_empty());
            assert!(clean.times.is_empty());
        }
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            json!({
                "name": format!("{} x", "a".repeat(99)),
                "times": ["08:00", "bad"],
                "notes": format!("{}   tail", "n".repeat(497)),
                "duration": 12.7,
                "refillDate": "2024-06-01",
                "refillReminder": true,
                "remindBefore": "3",
                "tags": [" a ", ""]
            }),
            json!({ "name": 42, "duration": 0, "refillDate": "soon" }),
            json!({}),
        ];
        for raw in inputs {
            let once = sanitize(&raw);
            let twice = sanitize(&serde_json::to_value(&once).unwrap());
            assert_eq!(once, twice);
        }
    }
}
