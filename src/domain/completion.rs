/// Completion records and per-day quantity state
///
/// A CompletionEvent says "this habit was done on this day". There is at
/// most one per (habit, day); the storage layer enforces that with an
/// idempotent upsert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DayKey, HabitId};

/// A record of completing a habit on a specific local day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Which habit this completion is for
    pub habit_id: HabitId,
    /// The day it counts for, already normalized to the habit's timezone
    pub day: DayKey,
    /// When it was recorded (audit only, never used in computations)
    pub recorded_at: DateTime<Utc>,
}

impl CompletionEvent {
    pub fn new(habit_id: HabitId, day: DayKey, recorded_at: DateTime<Utc>) -> Self {
        Self { habit_id, day, recorded_at }
    }
}

/// Accumulated quantity for one habit on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityState {
    pub habit_id: HabitId,
    pub day: DayKey,
    /// Never negative
    pub current_quantity: f64,
}

impl QuantityState {
    /// Whether this day's quantity reaches `target`
    pub fn meets(&self, target: f64) -> bool {
        self.current_quantity >= target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_meets_target_inclusively() {
        let state = QuantityState {
            habit_id: HabitId::new(),
            day: "2024-04-01".parse().unwrap(),
            current_quantity: 8.0,
        };
        assert!(state.meets(8.0));
        assert!(!state.meets(8.5));
    }
}
