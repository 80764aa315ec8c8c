use super::DoseTime;
use crate::validation::SanitizedMedicine;
use chrono::{Days, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One dose recorded as taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TakenDose {
    pub date: NaiveDate,
    pub time: DoseTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub times: Vec<DoseTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Active regimen length in days; `None` means indefinite.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub taken: Vec<TakenDose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refill_date: Option<NaiveDate>,
    #[serde(default)]
    pub refill_reminder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remind_before: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contraindications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Medicine {
    /// Builds a new record from sanitized input. The intake history starts empty.
    pub fn admit(id: impl Into<String>, record: SanitizedMedicine, now: NaiveDateTime) -> Self {
        Self {
            id: id.into(),
            name: record.name,
            times: record.times,
            dosage: non_empty(record.dosage),
            instructions: non_empty(record.instructions),
            duration: record.duration,
            created_at: now,
            updated_at: None,
            taken: Vec::new(),
            refill_date: record.refill_date,
            refill_reminder: record.refill_reminder,
            remind_before: record.remind_before,
            notes: non_empty(record.notes),
            side_effects: non_empty(record.side_effects),
            contraindications: non_empty(record.contraindications),
            external_id: None,
            tags: record.tags,
        }
    }

    /// Returns a copy with the editable fields replaced. Identity, creation time and
    /// intake history carry over unchanged.
    pub fn with_update(&self, record: SanitizedMedicine, now: NaiveDateTime) -> Self {
        Self {
            updated_at: Some(now),
            taken: self.taken.clone(),
            external_id: self.external_id.clone(),
            ..Self::admit(self.id.clone(), record, self.created_at)
        }
    }

    /// First calendar date on which the regimen is no longer active.
    pub fn active_until(&self) -> Option<NaiveDate> {
        let start = self.created_at.date();
        self.duration
            .map(|days| start.checked_add_days(Days::new(u64::from(days))).unwrap_or(NaiveDate::MAX))
    }

    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        if date < self.created_at.date() {
            return false;
        }
        match self.active_until() {
            Some(end) => date < end,
            None => true,
        }
    }

    pub fn scheduled_doses_on(&self, date: NaiveDate) -> usize {
        if self.is_scheduled_on(date) {
            self.times.len()
        } else {
            0
        }
    }

    pub fn has_taken(&self, date: NaiveDate, time: DoseTime) -> bool {
        self.taken.iter().any(|t| t.date == date && t.time == time)
    }

    /// Counts intake entries dated within `[start, end]`.
    pub fn taken_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.taken
            .iter()
            .filter(|t| t.date >= start && t.date <= end)
            .count()
    }

    /// Returns a copy with the `(date, time)` dose flipped: removed when present,
    /// appended otherwise.
    pub fn with_toggled_dose(&self, date: NaiveDate, time: DoseTime) -> Self {
        let mut next = self.clone();
        if self.has_taken(date, time) {
            next.taken.retain(|t| !(t.date == date && t.time == time));
        } else {
            next.taken.push(TakenDose { date, time });
        }
        next
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Local wall-clock timestamps. Records written with an explicit offset
/// (`...Z`, `+02:00`) are read as the wall-clock time at that offset.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        value
            .parse::<NaiveDateTime>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.naive_local()))
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw))),
                None => Ok(None),
            }
        }
    }
}
