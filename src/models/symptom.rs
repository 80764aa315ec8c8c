use super::Severity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single symptom observation, linked to a medicine by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomLog {
    pub id: String,
    pub medicine_id: String,
    pub date: NaiveDate,
    pub symptom: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
