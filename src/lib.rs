//! Medication tracking analytics.
//!
//! The calculators (`adherence`, `interactions`, `reminders`, `refill`, `symptoms`,
//! `search`) are pure functions over an in-memory medicine collection. Current time
//! is always passed in by the caller as local wall-clock time. `validation` and
//! `store` guard the write boundary; persistence sits behind the repository traits.

pub mod adherence;
pub mod config;
pub mod error;
pub mod interactions;
pub mod models;
pub mod output;
pub mod refill;
pub mod reminders;
pub mod search;
pub mod store;
pub mod symptoms;
pub mod validation;

pub use error::{TrackerError, TrackerResult};
