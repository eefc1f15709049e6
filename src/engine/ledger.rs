/// Completion ledger
///
/// At most one completion per habit per day; recording twice is a no-op.

use chrono::{DateTime, Utc};

use crate::domain::{CompletionEvent, DayKey, HabitId};
use crate::engine::{EngineError, StoreResultExt};
use crate::storage::HabitStore;

pub struct CompletionLedger<'a, S: HabitStore> {
    store: &'a S,
}

impl<'a, S: HabitStore> CompletionLedger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record a completion. Returns `false` when the day was already complete.
    pub fn record_completion(
        &self,
        habit_id: &HabitId,
        day: DayKey,
        recorded_at: DateTime<Utc>,
    ) -> Result<bool, EngineError> {
        let event = CompletionEvent::new(habit_id.clone(), day, recorded_at);
        let written = self.store.upsert_completion(&event).during("record_completion")?;
        if written {
            tracing::debug!("Recorded completion for {} on {}", habit_id, day);
        }
        Ok(written)
    }

    /// Remove a completion. Returns `false` when there was nothing to remove.
    pub fn remove_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, EngineError> {
        let removed = self.store.delete_completion(habit_id, day).during("remove_completion")?;
        if removed {
            tracing::debug!("Removed completion for {} on {}", habit_id, day);
        }
        Ok(removed)
    }

    pub fn has_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, EngineError> {
        self.store.has_completion(habit_id, day).during("has_completion")
    }

    /// Completed days, most recent first, without duplicates
    pub fn completed_days(&self, habit_id: &HabitId) -> Result<Vec<DayKey>, EngineError> {
        let mut days: Vec<DayKey> = self
            .store
            .list_completions(habit_id)
            .during("list_completions")?
            .into_iter()
            .map(|event| event.day)
            .collect();
        days.sort_unstable_by(|a, b| b.cmp(a));
        days.dedup();
        Ok(days)
    }
}
