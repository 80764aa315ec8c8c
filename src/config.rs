use crate::error::{TrackerError, TrackerResult};
use crate::interactions::InteractionTable;
use crate::refill::{DEFAULT_REMIND_BEFORE_DAYS, DEFAULT_SUPPLY_DAYS};
use crate::reminders::{DEFAULT_HOURS_AHEAD, DEFAULT_REMINDER_MINUTES};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reminders: ReminderConfig,
    pub refill: RefillConfig,
    pub interactions: InteractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub minutes_before: i64, // due-now lookahead
    pub hours_ahead: i64,    // schedule and offset lookahead
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            minutes_before: DEFAULT_REMINDER_MINUTES,
            hours_ahead: DEFAULT_HOURS_AHEAD,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefillConfig {
    pub default_remind_before_days: u32,
    pub estimated_supply_days: u32,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            default_remind_before_days: DEFAULT_REMIND_BEFORE_DAYS,
            estimated_supply_days: DEFAULT_SUPPLY_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// CSV file of extra interaction rules.
    pub table: Option<PathBuf>,
    pub include_builtin: bool,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            table: None,
            include_builtin: true,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> TrackerResult<()> {
        if self.reminders.minutes_before <= 0 {
            return Err(TrackerError::InvalidConfig(
                "reminders.minutes_before must be positive".to_string(),
            ));
        }

        if !(1..=168).contains(&self.reminders.hours_ahead) {
            return Err(TrackerError::InvalidConfig(
                "reminders.hours_ahead must be between 1 and 168".to_string(),
            ));
        }

        if self.refill.default_remind_before_days > 24 {
            return Err(TrackerError::InvalidConfig(
                "refill.default_remind_before_days must be between 0 and 24".to_string(),
            ));
        }

        if self.refill.estimated_supply_days == 0 {
            return Err(TrackerError::InvalidConfig(
                "refill.estimated_supply_days must be positive".to_string(),
            ));
        }

        if !self.interactions.include_builtin && self.interactions.table.is_none() {
            return Err(TrackerError::InvalidConfig(
                "interactions: a table is required when the built-in table is disabled".to_string(),
            ));
        }

        Ok(())
    }

    /// Builds the interaction table this configuration describes.
    pub fn interaction_table(&self) -> TrackerResult<InteractionTable> {
        let mut table = if self.interactions.include_builtin {
            InteractionTable::builtin()
        } else {
            InteractionTable::empty()
        };

        if let Some(path) = &self.interactions.table {
            let extra = InteractionTable::from_csv_path(path)?;
            info!("Loaded {} interaction rules from {:?}", extra.len(), path);
            table.merge(extra);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reminders.minutes_before, 30);
        assert_eq!(config.reminders.hours_ahead, 24);
        assert_eq!(config.refill.default_remind_before_days, 3);
        assert_eq!(config.interaction_table().unwrap().len(), 14);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reminders": {{ "minutes_before": 15 }} }}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.reminders.minutes_before, 15);
        assert_eq!(config.reminders.hours_ahead, 24);
        assert!(config.interactions.include_builtin);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.reminders.hours_ahead = 0;
        assert!(matches!(config.validate(), Err(TrackerError::InvalidConfig(_))));

        let mut config = Config::default();
        config.interactions.include_builtin = false;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.refill.estimated_supply_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_table_replaces_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        std::fs::write(
            &path,
            "drug,other_drug,severity,description\nsertraline,tramadol,severe,Serotonin syndrome risk\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.interactions.table = Some(path);
        assert_eq!(config.interaction_table().unwrap().len(), 15);

        config.interactions.include_builtin = false;
        let table = config.interaction_table().unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.rules_for("warfarin").is_empty());
    }
}
