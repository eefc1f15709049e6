/// Domain module containing the pure progress computations and data types
///
/// Everything in here is deterministic: no storage access, no system clock.
/// Day boundaries, cadence periods, streaks and snapshots are derived from
/// values the caller passes in.

pub mod types;
pub mod habit;
pub mod calendar;
pub mod completion;
pub mod streak;
pub mod progress;

// Re-export public types for easy access
pub use types::*;
pub use habit::*;
pub use calendar::*;
pub use completion::*;
pub use streak::*;
pub use progress::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    /// A derived value broke one of its own guarantees. This is a bug,
    /// not bad input.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}
