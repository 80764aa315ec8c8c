pub mod medicine;
pub mod symptom;

use crate::error::{TrackerError, TrackerResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub use medicine::*;
pub use symptom::*;

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("static pattern"))
}

/// Returns true when `value` has the `HH:MM` shape and names a real time of day.
pub fn is_valid_time(value: &str) -> bool {
    value.parse::<DoseTime>().is_ok()
}

/// A daily dose slot in 24-hour `HH:MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime {
    hour: u8,
    minute: u8,
}

impl DoseTime {
    pub fn new(hour: u8, minute: u8) -> TrackerResult<Self> {
        if hour >= 24 || minute >= 60 {
            return Err(TrackerError::InvalidTime(format!("{:02}:{:02}", hour, minute)));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn to_naive_time(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

impl FromStr for DoseTime {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !time_pattern().is_match(s) {
            return Err(TrackerError::InvalidTime(s.to_string()));
        }
        let hour = s[0..2].parse::<u8>().map_err(|_| TrackerError::InvalidTime(s.to_string()))?;
        let minute = s[3..5].parse::<u8>().map_err(|_| TrackerError::InvalidTime(s.to_string()))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for DoseTime {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DoseTime> for String {
    fn from(value: DoseTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Qualitative risk tier shared by interactions and symptom reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    /// Numeric weight used when averaging severities (mild = 1 .. severe = 3).
    pub fn score(&self) -> u8 {
        match self {
            Self::Mild => 1,
            Self::Moderate => 2,
            Self::Severe => 3,
        }
    }
}

impl FromStr for Severity {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Self::Mild),
            "moderate" => Ok(Self::Moderate),
            "severe" => Ok(Self::Severe),
            other => Err(TrackerError::InvalidTable(format!("unknown severity: {}", other))),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a single dose slot for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Pending,
    Taken,
    Overdue,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Taken => "taken",
            Self::Overdue => "overdue",
        }
    }
}

impl FromStr for DoseStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "taken" => Ok(Self::Taken),
            "overdue" => Ok(Self::Overdue),
            other => Err(TrackerError::InvalidConfig(format!("unknown dose status: {}", other))),
        }
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
