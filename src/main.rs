use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use medtrack::adherence::calculate_adherence;
use medtrack::config::Config;
use medtrack::models::{DoseStatus, DoseTime, Medicine, Severity};
use medtrack::output;
use medtrack::refill::{estimate_next_refill, refill_notifications_with};
use medtrack::reminders::{dose_status, due_reminders, medicines_by_status, next_doses, offset_reminders};
use medtrack::search::search_medicines;
use medtrack::store::{self, JsonFileRepository, MedicineRepository, SymptomLogRepository};
use medtrack::symptoms::{correlate_symptom_with_medicine, log_symptom};
use medtrack::validation::validate;

#[derive(Parser)]
#[command(name = "medtrack")]
#[command(about = "Medication adherence, interaction and reminder reports")]
struct Cli {
    /// Medicine collection (JSON array)
    #[arg(short, long)]
    data: PathBuf,

    /// Symptom log (JSON array)
    #[arg(short, long)]
    symptoms: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Adherence over the last 7 and 30 days
    Adherence,
    /// Daily adherence trend as CSV
    Trend,
    /// Known interactions between current medicines
    Interactions,
    /// Next occurrence of every dose slot
    Doses {
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=168))]
        hours: Option<i64>,
    },
    /// Untaken doses due within the next few minutes
    Reminders {
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        minutes: Option<i64>,
    },
    /// Reminders shifted earlier by each medicine's remind-before hours
    OffsetReminders {
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=168))]
        hours: Option<i64>,
    },
    /// Refills due soon
    Refills,
    /// Projected next refill date for one medicine
    RefillEstimate { id: String },
    /// Recurring symptoms per medicine
    Symptoms,
    /// Status of today's dose slot
    Status {
        #[arg(long)]
        time: DoseTime,
        #[arg(long)]
        status: Option<DoseStatus>,
    },
    /// Free-text search over medicines
    Search { query: String },
    /// Add a medicine from a JSON record
    Add { record: PathBuf },
    /// Replace a medicine's fields from a JSON record
    Update { id: String, record: PathBuf },
    /// Remove a medicine
    Delete { id: String },
    /// Mark a dose taken, or unmark it
    Toggle {
        id: String,
        #[arg(long)]
        time: DoseTime,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Record a symptom against a medicine
    LogSymptom {
        medicine_id: String,
        symptom: String,
        #[arg(long, default_value = "mild")]
        severity: Severity,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Check a JSON record without storing it
    Validate { record: PathBuf },
}

fn read_record(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Record {:?} is not valid JSON", path))
}

fn symptom_repository(cli: &Cli) -> Result<JsonFileRepository> {
    match &cli.symptoms {
        Some(path) => Ok(JsonFileRepository::new(path)),
        None => bail!("--symptoms is required for this command"),
    }
}

fn emit<T, F>(format: Format, value: &T, render: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&mut io::StdoutLock<'_>) -> medtrack::TrackerResult<()>,
{
    let mut out = io::stdout().lock();
    match format {
        Format::Json => output::write_json(&mut out, value)?,
        Format::Text => render(&mut out)?,
    }
    out.flush()?;
    Ok(())
}

fn run(cli: &Cli, config: &Config, now: NaiveDateTime) -> Result<()> {
    let repo = JsonFileRepository::new(&cli.data);
    let medicines: Vec<Medicine> = repo
        .load()
        .with_context(|| format!("Failed to load medicines from {:?}", cli.data))?;
    let today = now.date();

    match &cli.command {
        Command::Adherence => {
            let metrics = calculate_adherence(&medicines, today);
            emit(cli.format, &metrics, |out| output::render_adherence(out, &metrics))?;
        }
        Command::Trend => {
            let metrics = calculate_adherence(&medicines, today);
            output::write_trend_csv(io::stdout().lock(), &metrics.trends)?;
        }
        Command::Interactions => {
            let table = config.interaction_table()?;
            let results = table.check(&medicines);
            if results.iter().any(|r| r.severity == Severity::Severe) {
                warn!("Severe interactions found between current medicines");
            }
            emit(cli.format, &results, |out| output::render_interactions(out, &results))?;
        }
        Command::Doses { hours } => {
            let doses = next_doses(&medicines, now, hours.unwrap_or(config.reminders.hours_ahead));
            emit(cli.format, &doses, |out| output::render_next_doses(out, &doses))?;
        }
        Command::Reminders { minutes } => {
            let minutes = minutes.unwrap_or(config.reminders.minutes_before);
            let reminders = due_reminders(&medicines, now, minutes);
            emit(cli.format, &reminders, |out| output::render_reminders(out, &reminders))?;
        }
        Command::OffsetReminders { hours } => {
            let hours = hours.unwrap_or(config.reminders.hours_ahead);
            let reminders = offset_reminders(&medicines, now, hours);
            emit(cli.format, &reminders, |out| output::render_reminders(out, &reminders))?;
        }
        Command::Refills => {
            let notes =
                refill_notifications_with(&medicines, today, config.refill.default_remind_before_days);
            emit(cli.format, &notes, |out| output::render_refills(out, &notes))?;
        }
        Command::RefillEstimate { id } => {
            let Some(medicine) = medicines.iter().find(|m| &m.id == id) else {
                bail!("Medicine not found: {}", id);
            };
            let estimate = estimate_next_refill(medicine, today, config.refill.estimated_supply_days);
            emit(cli.format, &estimate, |out| {
                writeln!(out, "{}: next refill {} ({}-day supply)", medicine.name, estimate.date, estimate.days_supply)?;
                Ok(())
            })?;
        }
        Command::Symptoms => {
            let logs = symptom_repository(cli)?.load_symptoms()?;
            let correlations = correlate_symptom_with_medicine(&logs, &medicines);
            emit(cli.format, &correlations, |out| output::render_correlations(out, &correlations))?;
        }
        Command::Status { time, status } => match status {
            Some(status) => {
                let found = medicines_by_status(&medicines, *time, *status, now);
                emit(cli.format, &found, |out| output::render_medicines(out, &found))?;
            }
            None => {
                let statuses: Vec<(&str, DoseStatus)> = medicines
                    .iter()
                    .filter(|m| m.times.contains(time))
                    .map(|m| (m.name.as_str(), dose_status(m, *time, now)))
                    .collect();
                emit(cli.format, &statuses, |out| {
                    for (name, status) in &statuses {
                        writeln!(out, "{:<30} {}", name, status)?;
                    }
                    Ok(())
                })?;
            }
        },
        Command::Search { query } => {
            let found = search_medicines(&medicines, query);
            emit(cli.format, &found, |out| output::render_medicines(out, &found))?;
        }
        Command::Add { record } => {
            let raw = read_record(record)?;
            let (updated, added) = store::add_medicine(&medicines, &raw, now)?;
            repo.save(&updated)?;
            info!("Added {} ({})", added.name, added.id);
            emit(cli.format, &added, |out| output::render_medicines(out, &[&added]))?;
        }
        Command::Update { id, record } => {
            let raw = read_record(record)?;
            let updated = store::update_medicine(&medicines, id, &raw, now)?;
            repo.save(&updated)?;
            info!("Updated {}", id);
        }
        Command::Delete { id } => {
            let updated = store::delete_medicine(&medicines, id)?;
            repo.save(&updated)?;
            info!("Deleted {}", id);
        }
        Command::Toggle { id, time, date } => {
            let date = date.unwrap_or(today);
            let updated = store::toggle_dose(&medicines, id, date, *time, now)?;
            repo.save(&updated)?;
            let taken = updated.iter().any(|m| &m.id == id && m.has_taken(date, *time));
            info!("{} {} on {}: {}", id, time, date, if taken { "taken" } else { "not taken" });
        }
        Command::LogSymptom { medicine_id, symptom, severity, notes } => {
            if !medicines.iter().any(|m| &m.id == medicine_id) {
                bail!("Medicine not found: {}", medicine_id);
            }
            let symptoms = symptom_repository(cli)?;
            let mut logs = symptoms.load_symptoms()?;
            let entry = log_symptom(symptom, *severity, medicine_id, notes.clone(), today);
            info!("Logged {} for {} ({})", entry.symptom, medicine_id, entry.id);
            logs.push(entry);
            symptoms.save_symptoms(&logs)?;
        }
        Command::Validate { record } => {
            let errors = validate(&read_record(record)?);
            emit(cli.format, &errors, |out| output::render_validation(out, &errors))?;
            if !errors.is_empty() {
                bail!("{} validation errors", errors.len());
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env().filter_level(level).init();

    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    run(&cli, &config, Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookahead_flags_follow_config_ranges() {
        let parse = |args: &[&str]| {
            let mut argv = vec!["medtrack", "--data", "meds.json"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv)
        };

        assert!(parse(&["doses", "--hours", "168"]).is_ok());
        assert!(parse(&["doses", "--hours", "0"]).is_err());
        assert!(parse(&["doses", "--hours", "10000000000"]).is_err());
        assert!(parse(&["offset-reminders", "--hours", "169"]).is_err());
        assert!(parse(&["reminders", "--minutes", "45"]).is_ok());
        assert!(parse(&["reminders", "--minutes", "-5"]).is_err());
    }
}
