use crate::models::{Medicine, Severity, SymptomLog};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

pub const COMMON_SIDE_EFFECTS: [&str; 15] = [
    "Headache",
    "Nausea",
    "Dizziness",
    "Fatigue",
    "Insomnia",
    "Dry mouth",
    "Loss of appetite",
    "Stomach pain",
    "Constipation",
    "Diarrhea",
    "Rash",
    "Muscle pain",
    "Joint pain",
    "Mood changes",
    "Tremor",
];

pub fn common_side_effects() -> &'static [&'static str] {
    &COMMON_SIDE_EFFECTS
}

/// Creates a new observation dated `today` with a fresh id.
pub fn log_symptom(
    symptom: &str,
    severity: Severity,
    medicine_id: &str,
    notes: Option<String>,
    today: NaiveDate,
) -> SymptomLog {
    SymptomLog {
        id: Uuid::new_v4().to_string(),
        medicine_id: medicine_id.to_string(),
        date: today,
        symptom: symptom.trim().to_string(),
        severity,
        notes: notes.filter(|n| !n.trim().is_empty()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomCorrelation {
    pub medicine: String,
    pub symptom: String,
    pub frequency: usize,
    /// Severity of the first observation in the group, not an average.
    pub avg_severity: Severity,
    /// Arithmetic mean of [`Severity::score`] across the group.
    pub mean_severity_score: f64,
    pub possible_cause: bool,
}

/// Matches the symptom text as stored, the same string the groups are keyed on.
fn mentions(side_effects: Option<&str>, symptom: &str) -> bool {
    !symptom.trim().is_empty()
        && side_effects.map_or(false, |text| text.to_lowercase().contains(&symptom.to_lowercase()))
}

/// Groups observations by `(medicine name, symptom)`. Groups seen once are dropped
/// unless the medicine's side-effect text mentions the symptom. Most frequent first.
pub fn correlate_symptom_with_medicine(
    logs: &[SymptomLog],
    medicines: &[Medicine],
) -> Vec<SymptomCorrelation> {
    let mut by_id: HashMap<&str, &Medicine> = HashMap::new();
    for medicine in medicines {
        by_id.entry(medicine.id.as_str()).or_insert(medicine);
    }

    let mut groups: Vec<(SymptomCorrelation, u32)> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for log in logs {
        let Some(medicine) = by_id.get(log.medicine_id.as_str()) else {
            debug!("Skipping symptom {} for unknown medicine {}", log.id, log.medicine_id);
            continue;
        };

        let key = (medicine.name.as_str(), log.symptom.as_str());
        match index.get(&key) {
            Some(&i) => {
                let (group, score_sum) = &mut groups[i];
                group.frequency += 1;
                *score_sum += u32::from(log.severity.score());
            }
            None => {
                index.insert(key, groups.len());
                groups.push((
                    SymptomCorrelation {
                        medicine: medicine.name.clone(),
                        symptom: log.symptom.clone(),
                        frequency: 1,
                        avg_severity: log.severity,
                        mean_severity_score: 0.0,
                        possible_cause: mentions(medicine.side_effects.as_deref(), &log.symptom),
                    },
                    u32::from(log.severity.score()),
                ));
            }
        }
    }

    let mut correlations: Vec<SymptomCorrelation> = groups
        .into_iter()
        .map(|(mut group, score_sum)| {
            group.mean_severity_score = f64::from(score_sum) / group.frequency as f64;
            group
        })
        .filter(|c| c.frequency > 1 || c.possible_cause)
        .collect();

    correlations.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    correlations
}
