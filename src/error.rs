use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid medicine: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    #[error("Medicine not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid dose time: {0}")]
    InvalidTime(String),

    #[error("Invalid interaction table: {0}")]
    InvalidTable(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type TrackerResult<T> = Result<T, TrackerError>;
