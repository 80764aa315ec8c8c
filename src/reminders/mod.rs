//! Upcoming-dose views over the daily schedule.
//!
//! Three lookups with deliberately different rules:
//! - [`next_doses`]: pure schedule, every slot rolls to its next occurrence, taken or not.
//! - [`due_reminders`]: short lookahead in minutes over today's slots, skipping doses
//!   already taken today.
//! - [`offset_reminders`]: hours lookahead over today's slots shifted earlier by each
//!   medicine's `remind_before` hours, taken doses included.

use crate::models::{DoseStatus, DoseTime, Medicine};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use log::debug;
use serde::Serialize;

pub const DEFAULT_REMINDER_MINUTES: i64 = 30;
pub const DEFAULT_HOURS_AHEAD: i64 = 24;

/// Every dose slot recurs within a day, so lookaheads beyond two days select nothing more.
const LOOKAHEAD_CAP_MINUTES: i64 = 2 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDose {
    pub medicine_id: String,
    pub medicine_name: String,
    pub time: DoseTime,
    pub dosage: Option<String>,
    pub minutes_until: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder<'a> {
    pub medicine: &'a Medicine,
    pub time: DoseTime,
    pub minutes_until: i64,
}

fn occurrence_on(date: NaiveDate, time: DoseTime) -> NaiveDateTime {
    date.and_time(time.to_naive_time())
}

fn rounded_minutes(delta: Duration) -> i64 {
    (delta.num_seconds() + 30).div_euclid(60)
}

fn floored_minutes(delta: Duration) -> i64 {
    delta.num_seconds().div_euclid(60)
}

/// Next occurrence of every dose slot within `[now, now + hours_ahead)`, soonest first.
pub fn next_doses(medicines: &[Medicine], now: NaiveDateTime, hours_ahead: i64) -> Vec<NextDose> {
    let horizon = now + Duration::minutes(hours_ahead.clamp(0, LOOKAHEAD_CAP_MINUTES / 60) * 60);
    let mut doses = Vec::new();

    for medicine in medicines {
        for &time in &medicine.times {
            let mut occurrence = occurrence_on(now.date(), time);
            if occurrence < now {
                occurrence += Duration::days(1);
            }
            if occurrence >= now && occurrence < horizon {
                doses.push(NextDose {
                    medicine_id: medicine.id.clone(),
                    medicine_name: medicine.name.clone(),
                    time,
                    dosage: medicine.dosage.clone(),
                    minutes_until: rounded_minutes(occurrence - now),
                });
            }
        }
    }

    doses.sort_by_key(|d| d.minutes_until);
    debug!("{} doses due in the next {}h", doses.len(), hours_ahead);
    doses
}

/// Today's untaken doses falling due within the next `minutes_before` minutes.
pub fn due_reminders(
    medicines: &[Medicine],
    now: NaiveDateTime,
    minutes_before: i64,
) -> Vec<Reminder<'_>> {
    let today = now.date();
    let window = Duration::minutes(minutes_before.clamp(0, LOOKAHEAD_CAP_MINUTES));
    let mut reminders = Vec::new();

    for medicine in medicines {
        for &time in &medicine.times {
            let until = occurrence_on(today, time) - now;
            if until <= Duration::zero() || until > window {
                continue;
            }
            if medicine.has_taken(today, time) {
                continue;
            }
            reminders.push(Reminder {
                medicine,
                time,
                minutes_until: rounded_minutes(until),
            });
        }
    }

    reminders.sort_by_key(|r| r.minutes_until);
    reminders
}

/// Today's doses whose reminder time (dose time minus `remind_before` hours) falls
/// within the next `hours_ahead` hours.
pub fn offset_reminders(
    medicines: &[Medicine],
    now: NaiveDateTime,
    hours_ahead: i64,
) -> Vec<Reminder<'_>> {
    let today = now.date();
    let limit = hours_ahead.saturating_mul(60);
    let mut reminders = Vec::new();

    for medicine in medicines {
        let offset = Duration::hours(i64::from(medicine.remind_before.unwrap_or(0)));
        for &time in &medicine.times {
            // An offset reaching past the calendar range can never fall ahead of now.
            let Some(remind_at) = occurrence_on(today, time).checked_sub_signed(offset) else {
                continue;
            };
            let minutes_until = floored_minutes(remind_at - now);
            if (0..=limit).contains(&minutes_until) {
                reminders.push(Reminder {
                    medicine,
                    time,
                    minutes_until,
                });
            }
        }
    }

    reminders.sort_by_key(|r| r.minutes_until);
    reminders
}

/// Status of today's `time` slot for `medicine`.
pub fn dose_status(medicine: &Medicine, time: DoseTime, now: NaiveDateTime) -> DoseStatus {
    let today = now.date();
    if medicine.has_taken(today, time) {
        DoseStatus::Taken
    } else if occurrence_on(today, time) < now {
        DoseStatus::Overdue
    } else {
        DoseStatus::Pending
    }
}

/// Medicines scheduled at `time` whose slot today is in `status`.
pub fn medicines_by_status<'a>(
    medicines: &'a [Medicine],
    time: DoseTime,
    status: DoseStatus,
    now: NaiveDateTime,
) -> Vec<&'a Medicine> {
    medicines
        .iter()
        .filter(|m| m.times.contains(&time))
        .filter(|m| dose_status(m, time, now) == status)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::medicine::tests::{at, date, medicine};
    use crate::models::TakenDose;

    fn t(s: &str) -> DoseTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_next_doses_same_day() {
        let mut med = medicine("m1", "Metformin", &["20:00", "08:00"], "2024-01-01 06:00");
        med.dosage = Some("500mg".to_string());
        let doses = next_doses(&[med], at("2024-03-10 07:00"), 24);

        assert_eq!(doses.len(), 2);
        assert_eq!(doses[0].time, t("08:00"));
        assert_eq!(doses[0].minutes_until, 60);
        assert_eq!(doses[1].time, t("20:00"));
        assert_eq!(doses[1].minutes_until, 780);
        assert_eq!(doses[0].dosage.as_deref(), Some("500mg"));
    }

    #[test]
    fn test_next_doses_roll_to_tomorrow_and_ignore_taken() {
        let mut med = medicine("m1", "Metformin", &["08:00"], "2024-01-01 06:00");
        med.taken.push(TakenDose { date: date("2024-03-10"), time: t("08:00") });

        let doses = next_doses(&[med.clone()], at("2024-03-10 21:00"), 24);
        assert_eq!(doses.len(), 1);
        assert_eq!(doses[0].minutes_until, 660);

        let doses = next_doses(&[med], at("2024-03-10 07:30"), 24);
        assert_eq!(doses[0].minutes_until, 30);
    }

    #[test]
    fn test_next_doses_window_is_half_open() {
        let med = medicine("m1", "Aspirin", &["08:00", "09:00"], "2024-01-01 06:00");
        let doses = next_doses(&[med.clone()], at("2024-03-10 08:00"), 1);
        assert_eq!(doses.len(), 1);
        assert_eq!(doses[0].minutes_until, 0);

        assert!(next_doses(&[med], at("2024-03-10 07:00"), 0).is_empty());
    }

    #[test]
    fn test_due_reminders_skip_taken() {
        let mut first = medicine("m1", "Metformin", &["08:00", "07:45", "08:30"], "2024-01-01 06:00");
        let mut second = medicine("m2", "Lisinopril", &["07:50"], "2024-01-01 06:00");
        second.taken.push(TakenDose { date: date("2024-03-09"), time: t("07:50") });
        first.taken.push(TakenDose { date: date("2024-03-10"), time: t("08:00") });

        let meds = [first, second];
        let reminders = due_reminders(&meds, at("2024-03-10 07:45"), 30);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].medicine.id, "m2");
        assert_eq!(reminders[0].minutes_until, 5);
    }

    #[test]
    fn test_offset_reminders_apply_remind_before() {
        let mut early = medicine("m1", "Insulin", &["10:00", "09:00"], "2024-01-01 06:00");
        early.remind_before = Some(2);
        early.taken.push(TakenDose { date: date("2024-03-10"), time: t("10:00") });
        let plain = medicine("m2", "Aspirin", &["07:30", "18:00"], "2024-01-01 06:00");

        let meds = [early, plain];
        let reminders = offset_reminders(&meds, at("2024-03-10 07:30"), 24);
        let summary: Vec<_> = reminders
            .iter()
            .map(|r| (r.medicine.id.as_str(), r.time.to_string(), r.minutes_until))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("m2", "07:30".to_string(), 0),
                ("m1", "10:00".to_string(), 30),
                ("m2", "18:00".to_string(), 630),
            ]
        );
    }

    #[test]
    fn test_oversized_lookahead_covers_the_whole_day() {
        let med = medicine("m1", "Metformin", &["08:00", "20:00"], "2024-01-01 06:00");
        let now = at("2024-03-10 07:00");

        assert_eq!(next_doses(&[med.clone()], now, 10_000_000_000).len(), 2);
        assert_eq!(next_doses(&[med.clone()], now, i64::MAX).len(), 2);
        assert!(next_doses(&[med.clone()], now, i64::MIN).is_empty());
        assert_eq!(due_reminders(&[med.clone()], now, i64::MAX).len(), 2);
        assert!(due_reminders(&[med.clone()], now, i64::MIN).is_empty());
        assert_eq!(offset_reminders(&[med], now, i64::MAX).len(), 2);
    }

    #[test]
    fn test_offset_beyond_calendar_range_is_skipped() {
        let mut med = medicine("m1", "Insulin", &["08:00"], "2024-01-01 06:00");
        med.remind_before = Some(u32::MAX);
        let plain = medicine("m2", "Aspirin", &["09:00"], "2024-01-01 06:00");

        let meds = [med, plain];
        let reminders = offset_reminders(&meds, at("2024-03-10 07:00"), 24);
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].medicine.id, "m2");
    }

    #[test]
    fn test_dose_status() {
        let mut med = medicine("m1", "Aspirin", &["08:00", "12:00", "20:00"], "2024-01-01 06:00");
        med.taken.push(TakenDose { date: date("2024-03-10"), time: t("08:00") });
        let now = at("2024-03-10 13:00");

        assert_eq!(dose_status(&med, t("08:00"), now), DoseStatus::Taken);
        assert_eq!(dose_status(&med, t("12:00"), now), DoseStatus::Overdue);
        assert_eq!(dose_status(&med, t("20:00"), now), DoseStatus::Pending);

        let other = medicine("m2", "Metformin", &["20:00"], "2024-01-01 06:00");
        let meds = [med, other];
        assert_eq!(medicines_by_status(&meds, t("20:00"), DoseStatus::Pending, now).len(), 2);
        assert!(medicines_by_status(&meds, t("12:00"), DoseStatus::Taken, now).is_empty());
    }
}
