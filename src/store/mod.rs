//! Collection-level writes and the repository seam.
//!
//! Every transform takes the current collection by reference and returns a new
//! one; nothing is mutated in place. Persisting the result is the caller's job.

pub mod json_file;

use crate::error::{TrackerError, TrackerResult};
use crate::models::{DoseTime, Medicine, SymptomLog};
use crate::validation::{sanitize, validate};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde_json::Value;
use uuid::Uuid;

pub use json_file::JsonFileRepository;

pub trait MedicineRepository {
    fn load(&self) -> TrackerResult<Vec<Medicine>>;
    fn save(&self, medicines: &[Medicine]) -> TrackerResult<()>;
}

pub trait SymptomLogRepository {
    fn load_symptoms(&self) -> TrackerResult<Vec<SymptomLog>>;
    fn save_symptoms(&self, logs: &[SymptomLog]) -> TrackerResult<()>;
}

fn admissible(raw: &Value) -> TrackerResult<()> {
    let errors = validate(raw);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TrackerError::Validation(errors))
    }
}

fn position(medicines: &[Medicine], id: &str) -> TrackerResult<usize> {
    medicines
        .iter()
        .position(|m| m.id == id)
        .ok_or_else(|| TrackerError::NotFound(id.to_string()))
}

/// Validates and admits `raw` as a new medicine with a fresh id.
pub fn add_medicine(
    medicines: &[Medicine],
    raw: &Value,
    now: NaiveDateTime,
) -> TrackerResult<(Vec<Medicine>, Medicine)> {
    admissible(raw)?;
    let medicine = Medicine::admit(Uuid::new_v4().to_string(), sanitize(raw), now);
    debug!("Admitted medicine {} ({})", medicine.name, medicine.id);

    let mut updated = medicines.to_vec();
    updated.push(medicine.clone());
    Ok((updated, medicine))
}

/// Replaces the editable fields of medicine `id`; intake history is kept.
pub fn update_medicine(
    medicines: &[Medicine],
    id: &str,
    raw: &Value,
    now: NaiveDateTime,
) -> TrackerResult<Vec<Medicine>> {
    admissible(raw)?;
    let index = position(medicines, id)?;
    let record = sanitize(raw);

    let mut updated = medicines.to_vec();
    updated[index] = medicines[index].with_update(record, now);
    Ok(updated)
}

pub fn delete_medicine(medicines: &[Medicine], id: &str) -> TrackerResult<Vec<Medicine>> {
    position(medicines, id)?;
    Ok(medicines.iter().filter(|m| m.id != id).cloned().collect())
}

/// Marks the dose taken, or unmarks it when already recorded.
pub fn toggle_dose(
    medicines: &[Medicine],
    id: &str,
    date: NaiveDate,
    time: DoseTime,
    now: NaiveDateTime,
) -> TrackerResult<Vec<Medicine>> {
    let index = position(medicines, id)?;

    let mut updated = medicines.to_vec();
    let mut toggled = medicines[index].with_toggled_dose(date, time);
    toggled.updated_at = Some(now);
    updated[index] = toggled;
    Ok(updated)
}
