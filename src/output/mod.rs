use crate::adherence::{AdherenceMetrics, AdherenceStats};
use crate::error::TrackerResult;
use crate::interactions::{severity_counts, InteractionResult};
use crate::models::Medicine;
use crate::refill::RefillNotification;
use crate::reminders::{NextDose, Reminder};
use crate::symptoms::SymptomCorrelation;
use crate::validation::ValidationError;
use serde::Serialize;
use std::io::Write;

pub fn write_json<T: Serialize + ?Sized, W: Write>(writer: &mut W, value: &T) -> TrackerResult<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

/// Daily trend as CSV, one row per day.
pub fn write_trend_csv<W: Write>(writer: W, trends: &[AdherenceStats]) -> TrackerResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["DATE", "SCHEDULED", "TAKEN", "MISSED", "ADHERENCE_RATE"])?;
    for day in trends {
        csv_writer.write_record(&[
            day.date.to_string(),
            day.scheduled_doses.to_string(),
            day.taken_doses.to_string(),
            day.missed_doses.to_string(),
            day.adherence_rate.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn render_adherence<W: Write>(writer: &mut W, metrics: &AdherenceMetrics) -> TrackerResult<()> {
    writeln!(writer, "Overall adherence: {}%", metrics.overall)?;
    writeln!(writer, "Last 7 days:       {}%", metrics.week)?;
    writeln!(writer, "Last 30 days:      {}%", metrics.month)?;

    if !metrics.by_medicine.is_empty() {
        writeln!(writer)?;
        for med in &metrics.by_medicine {
            writeln!(writer, "  {:<30} {:>3}%", med.medicine_name, med.adherence_rate)?;
        }
    }

    let missed: usize = metrics.trends.iter().map(|d| d.missed_doses).sum();
    writeln!(writer)?;
    writeln!(writer, "Missed doses (30 days): {}", missed)?;
    Ok(())
}

pub fn render_interactions<W: Write>(writer: &mut W, results: &[InteractionResult]) -> TrackerResult<()> {
    if results.is_empty() {
        writeln!(writer, "No known interactions")?;
        return Ok(());
    }

    for result in results {
        writeln!(
            writer,
            "[{}] {} + {}: {}",
            result.severity, result.medicine1, result.medicine2, result.description
        )?;
    }

    let counts = severity_counts(results);
    writeln!(
        writer,
        "{} severe, {} moderate, {} mild",
        counts.severe, counts.moderate, counts.mild
    )?;
    Ok(())
}

pub fn render_next_doses<W: Write>(writer: &mut W, doses: &[NextDose]) -> TrackerResult<()> {
    if doses.is_empty() {
        writeln!(writer, "No upcoming doses")?;
    }
    for dose in doses {
        writeln!(
            writer,
            "{} {:<30} {:<15} in {} min",
            dose.time,
            dose.medicine_name,
            dose.dosage.as_deref().unwrap_or("As prescribed"),
            dose.minutes_until
        )?;
    }
    Ok(())
}

pub fn render_reminders<W: Write>(writer: &mut W, reminders: &[Reminder<'_>]) -> TrackerResult<()> {
    if reminders.is_empty() {
        writeln!(writer, "No reminders due")?;
    }
    for reminder in reminders {
        writeln!(
            writer,
            "Time to take {} at {} (in {} min)",
            reminder.medicine.name, reminder.time, reminder.minutes_until
        )?;
    }
    Ok(())
}

pub fn render_refills<W: Write>(writer: &mut W, notifications: &[RefillNotification]) -> TrackerResult<()> {
    if notifications.is_empty() {
        writeln!(writer, "No refills due")?;
    }
    for note in notifications {
        let flag = if note.urgent { "URGENT " } else { "" };
        writeln!(
            writer,
            "{}{}: refill on {} ({} days)",
            flag, note.medicine_name, note.refill_date, note.days_until_refill
        )?;
    }
    Ok(())
}

pub fn render_correlations<W: Write>(writer: &mut W, correlations: &[SymptomCorrelation]) -> TrackerResult<()> {
    if correlations.is_empty() {
        writeln!(writer, "No symptom patterns found")?;
    }
    for c in correlations {
        let cause = if c.possible_cause { " (known side effect)" } else { "" };
        writeln!(
            writer,
            "{} / {}: {}x, first {}, mean severity {:.1}{}",
            c.medicine, c.symptom, c.frequency, c.avg_severity, c.mean_severity_score, cause
        )?;
    }
    Ok(())
}

pub fn render_medicines<W: Write>(writer: &mut W, medicines: &[&Medicine]) -> TrackerResult<()> {
    for med in medicines {
        let times: Vec<String> = med.times.iter().map(|t| t.to_string()).collect();
        let duration = med
            .duration
            .map(|d| format!("{} days", d))
            .unwrap_or_else(|| "Indefinite".to_string());
        writeln!(
            writer,
            "{} {:<30} {:<15} {:<20} {}",
            med.id,
            med.name,
            med.dosage.as_deref().unwrap_or("N/A"),
            times.join(","),
            duration
        )?;
    }
    Ok(())
}

pub fn render_validation<W: Write>(writer: &mut W, errors: &[ValidationError]) -> TrackerResult<()> {
    if errors.is_empty() {
        writeln!(writer, "OK")?;
    }
    for error in errors {
        writeln!(writer, "{}: {}", error.field, error.message)?;
    }
    Ok(())
}
