use crate::models::Medicine;
use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REMIND_BEFORE_DAYS: u32 = 3;
pub const DEFAULT_SUPPLY_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillNotification {
    pub medicine_id: String,
    pub medicine_name: String,
    pub refill_date: NaiveDate,
    /// Negative once the refill date has passed.
    pub days_until_refill: i64,
    pub urgent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillEstimate {
    pub date: NaiveDate,
    pub days_supply: u32,
}

pub fn refill_notifications(medicines: &[Medicine], today: NaiveDate) -> Vec<RefillNotification> {
    refill_notifications_with(medicines, today, DEFAULT_REMIND_BEFORE_DAYS)
}

/// Refills due within each medicine's `remind_before` days, or `default_days`
/// when that is unset or zero. Soonest first.
pub fn refill_notifications_with(
    medicines: &[Medicine],
    today: NaiveDate,
    default_days: u32,
) -> Vec<RefillNotification> {
    let mut notifications: Vec<RefillNotification> = medicines
        .iter()
        .filter(|m| m.refill_reminder)
        .filter_map(|m| {
            let refill_date = m.refill_date?;
            let days_until_refill = (refill_date - today).num_days();
            let threshold = m.remind_before.filter(|&d| d > 0).unwrap_or(default_days);
            (days_until_refill <= i64::from(threshold)).then(|| RefillNotification {
                medicine_id: m.id.clone(),
                medicine_name: m.name.clone(),
                refill_date,
                days_until_refill,
                urgent: days_until_refill <= 1,
            })
        })
        .collect();

    notifications.sort_by_key(|n| n.days_until_refill);
    debug!("{} refill notifications for {}", notifications.len(), today);
    notifications
}

/// Projects the next refill from the last refill date (or today), assuming a
/// `supply_days` supply.
pub fn estimate_next_refill(medicine: &Medicine, today: NaiveDate, supply_days: u32) -> RefillEstimate {
    let last_refill = medicine.refill_date.unwrap_or(today);
    let days_since = (today - last_refill).num_days();
    let remaining = (i64::from(supply_days) - days_since).max(0) as u64;

    RefillEstimate {
        date: today.checked_add_days(Days::new(remaining)).unwrap_or(NaiveDate::MAX),
        days_supply: supply_days,
    }
}

/// Date a `days_supply` supply runs out, counted from the most recently recorded dose.
pub fn next_refill_from_last_dose(medicine: &Medicine, days_supply: u32, today: NaiveDate) -> NaiveDate {
    let base = medicine.taken.last().map(|t| t.date).unwrap_or(today);
    base.checked_add_days(Days::new(u64::from(days_supply)))
        .unwrap_or(NaiveDate::MAX)
}
