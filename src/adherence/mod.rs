use crate::models::Medicine;
use chrono::{Days, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

pub const MONTH_WINDOW_DAYS: u64 = 30;
pub const WEEK_WINDOW_DAYS: u64 = 7;

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The `days` calendar days ending on (and including) `today`.
    pub fn ending(today: NaiveDate, days: u64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceStats {
    pub date: NaiveDate,
    pub adherence_rate: u32,
    pub scheduled_doses: usize,
    pub taken_doses: usize,
    pub missed_doses: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineAdherence {
    pub medicine_id: String,
    pub medicine_name: String,
    pub adherence_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceMetrics {
    /// Same value as `month`; there is no longer window.
    pub overall: u32,
    pub week: u32,
    pub month: u32,
    pub by_medicine: Vec<MedicineAdherence>,
    pub trends: Vec<AdherenceStats>,
}

/// Percentage of scheduled doses taken, rounded and capped at 100.
/// Nothing scheduled counts as full compliance.
pub fn adherence_rate(taken: usize, scheduled: usize) -> u32 {
    if scheduled == 0 {
        return 100;
    }
    let rate = (taken as f64 / scheduled as f64 * 100.0).round();
    rate.min(100.0) as u32
}

pub fn scheduled_in(medicines: &[Medicine], window: &DateWindow) -> usize {
    window
        .dates()
        .map(|date| medicines.iter().map(|m| m.scheduled_doses_on(date)).sum::<usize>())
        .sum()
}

pub fn taken_in(medicines: &[Medicine], window: &DateWindow) -> usize {
    medicines
        .iter()
        .map(|m| m.taken_between(window.start, window.end))
        .sum()
}

fn window_rate(medicines: &[Medicine], window: &DateWindow) -> u32 {
    adherence_rate(taken_in(medicines, window), scheduled_in(medicines, window))
}

/// Scheduled-versus-taken metrics for the 7- and 30-day windows ending `today`.
pub fn calculate_adherence(medicines: &[Medicine], today: NaiveDate) -> AdherenceMetrics {
    let month_window = DateWindow::ending(today, MONTH_WINDOW_DAYS);
    let week_window = DateWindow::ending(today, WEEK_WINDOW_DAYS);

    let month = window_rate(medicines, &month_window);
    let week = window_rate(medicines, &week_window);

    let by_medicine = medicines
        .iter()
        .map(|med| MedicineAdherence {
            medicine_id: med.id.clone(),
            medicine_name: med.name.clone(),
            adherence_rate: window_rate(std::slice::from_ref(med), &month_window),
        })
        .collect();

    let trends = month_window
        .dates()
        .map(|date| {
            let day = DateWindow { start: date, end: date };
            let scheduled_doses = scheduled_in(medicines, &day);
            let taken_doses = taken_in(medicines, &day);
            AdherenceStats {
                date,
                adherence_rate: adherence_rate(taken_doses, scheduled_doses),
                scheduled_doses,
                taken_doses,
                missed_doses: scheduled_doses.saturating_sub(taken_doses),
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "Adherence for {} medicines: week {}%, month {}% ({} trend days)",
        medicines.len(),
        week,
        month,
        trends.len()
    );

    AdherenceMetrics {
        overall: month,
        week,
        month,
        by_medicine,
        trends,
    }
}
