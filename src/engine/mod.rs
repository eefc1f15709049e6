/// The habit progress engine
///
/// The ledger and accumulator put the domain rules in front of a
/// [`HabitStore`](crate::storage::HabitStore); the evaluator composes them
/// into snapshots and runs every mutation inside one store transaction.

pub mod ledger;
pub mod quantity;
pub mod evaluator;

pub use ledger::CompletionLedger;
pub use quantity::QuantityAccumulator;
pub use evaluator::ProgressEvaluator;

use thiserror::Error;

use crate::domain::{DomainError, Habit};
use crate::storage::StorageError;

/// Errors surfaced by engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    /// A quantity operation on a boolean habit, or a mark-done on a
    /// quantifiable one
    #[error("Invalid habit kind: {message}")]
    InvalidHabitKind { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Concurrent mutation conflict during {operation}: {source}")]
    ConcurrentMutationConflict {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("Store error during {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    /// A bug: derived state broke its own guarantees
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    /// Tag a store failure with the operation that hit it
    pub fn from_store(operation: &'static str, error: StorageError) -> Self {
        match error {
            StorageError::HabitNotFound { habit_id } => EngineError::HabitNotFound { habit_id },
            StorageError::ConcurrentMutationConflict { .. } => {
                EngineError::ConcurrentMutationConflict { operation, source: error }
            }
            other => EngineError::Store { operation, source: other },
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument { message: message.into() }
    }

    /// Short machine-readable name, used in tool error output
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::HabitNotFound { .. } => "habit_not_found",
            EngineError::InvalidHabitKind { .. } => "invalid_habit_kind",
            EngineError::InvalidArgument { .. } => "invalid_argument",
            EngineError::ConcurrentMutationConflict { .. } => "concurrent_mutation_conflict",
            EngineError::Store { .. } => "store_error",
            EngineError::InvariantViolation(_) => "invariant_violation",
        }
    }
}

impl From<DomainError> for EngineError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::InvariantViolation(message) => EngineError::InvariantViolation(message),
            other => EngineError::InvalidArgument { message: other.to_string() },
        }
    }
}

/// Failures starting or committing a transaction
impl From<StorageError> for EngineError {
    fn from(error: StorageError) -> Self {
        EngineError::from_store("transaction", error)
    }
}

/// Tag store results with the failing operation
pub(crate) trait StoreResultExt<T> {
    fn during(self, operation: &'static str) -> Result<T, EngineError>;
}

impl<T> StoreResultExt<T> for Result<T, StorageError> {
    fn during(self, operation: &'static str) -> Result<T, EngineError> {
        self.map_err(|e| EngineError::from_store(operation, e))
    }
}

pub(crate) fn require_boolean(habit: &Habit, operation: &str) -> Result<(), EngineError> {
    if habit.is_quantifiable() {
        return Err(EngineError::InvalidHabitKind {
            message: format!(
                "{} is not available for quantifiable habit '{}'; adjust its quantity instead",
                operation, habit.name
            ),
        });
    }
    Ok(())
}

pub(crate) fn require_quantifiable(habit: &Habit, operation: &str) -> Result<f64, EngineError> {
    habit.kind.target_quantity().ok_or_else(|| EngineError::InvalidHabitKind {
        message: format!(
            "{} is only available for quantifiable habits; '{}' is marked done directly",
            operation, habit.name
        ),
    })
}
