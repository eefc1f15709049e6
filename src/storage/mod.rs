/// Storage layer for persisting habits, completions and quantities
///
/// The engine treats storage as an external collaborator reached through
/// the [`HabitStore`] trait. Two implementations ship: SQLite for the server
/// and an in-memory store for embedding and tests.

pub mod sqlite;
pub mod memory;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;
pub use memory::*;

use thiserror::Error;

use crate::domain::{CompletionEvent, DayKey, Habit, HabitId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    /// Another writer holds the row or database; the caller may retry
    #[error("Concurrent mutation conflict: {message}")]
    ConcurrentMutationConflict { message: String },

    #[error("Corrupt record: {message}")]
    Corrupt { message: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, message)
                if matches!(
                    failure.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                StorageError::ConcurrentMutationConflict {
                    message: message.clone().unwrap_or_else(|| failure.to_string()),
                }
            }
            _ => StorageError::Query(error),
        }
    }
}

/// Trait defining the storage interface the engine needs
///
/// Per `(habit_id, day)` writes must be atomic: `upsert_completion` is an
/// idempotent insert and `increment_quantity` a read-modify-write the store
/// executes itself, never compute-then-overwrite by the caller.
pub trait HabitStore {
    /// Create a new habit
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Update an existing habit
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Delete a habit along with its completions and quantities
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// List all habits, newest first
    fn list_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// All completion events for a habit, most recent day first
    fn list_completions(&self, habit_id: &HabitId) -> Result<Vec<CompletionEvent>, StorageError>;

    fn has_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError>;

    /// Insert a completion unless one exists for that day. Returns whether
    /// a row was written.
    fn upsert_completion(&self, event: &CompletionEvent) -> Result<bool, StorageError>;

    /// Remove a completion. Returns whether a row was removed.
    fn delete_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError>;

    /// Quantity for a day, 0 when nothing was recorded
    fn get_quantity(&self, habit_id: &HabitId, day: DayKey) -> Result<f64, StorageError>;

    /// Every day with a stored quantity, oldest first
    fn list_quantities(&self, habit_id: &HabitId) -> Result<Vec<(DayKey, f64)>, StorageError>;

    fn set_quantity(&self, habit_id: &HabitId, day: DayKey, value: f64) -> Result<(), StorageError>;

    /// Atomically apply `max(0, current + delta)` and return the new value
    fn increment_quantity(&self, habit_id: &HabitId, day: DayKey, delta: f64) -> Result<f64, StorageError>;

    /// Run `f` so that either all of its writes land or none do
    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>;
}
