/// In-memory implementation of the habit store
///
/// Useful for embedding the engine without a database and for tests.
/// All state sits behind one mutex, so each call is atomic. Transactions
/// are serialized and roll back by restoring the state they started from.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{CompletionEvent, DayKey, Habit, HabitId};
use crate::storage::{HabitStore, StorageError};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    habits: HashMap<HabitId, Habit>,
    completions: HashMap<HabitId, BTreeMap<DayKey, CompletionEvent>>,
    quantities: HashMap<(HabitId, DayKey), f64>,
}

/// Mutex-guarded store keyed by habit ID
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
    /// Held for the duration of a transaction
    transaction_gate: Mutex<()>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Connection("memory store lock poisoned".to_string()))
    }

    fn require_habit(state: &MemoryState, habit_id: &HabitId) -> Result<(), StorageError> {
        if state.habits.contains_key(habit_id) {
            Ok(())
        } else {
            Err(StorageError::HabitNotFound { habit_id: habit_id.to_string() })
        }
    }
}

impl HabitStore for MemoryStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let mut state = self.state()?;
        if state.habits.contains_key(&habit.id) {
            return Err(StorageError::Corrupt {
                message: format!("habit {} already exists", habit.id),
            });
        }
        state.habits.insert(habit.id.clone(), habit.clone());
        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        self.state()?
            .habits
            .get(habit_id)
            .cloned()
            .ok_or_else(|| StorageError::HabitNotFound { habit_id: habit_id.to_string() })
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let mut state = self.state()?;
        Self::require_habit(&state, &habit.id)?;
        state.habits.insert(habit.id.clone(), habit.clone());
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let mut state = self.state()?;
        Self::require_habit(&state, habit_id)?;
        state.habits.remove(habit_id);
        state.completions.remove(habit_id);
        state.quantities.retain(|(id, _), _| id != habit_id);
        Ok(())
    }

    fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let mut habits: Vec<Habit> = self.state()?.habits.values().cloned().collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(habits)
    }

    fn list_completions(&self, habit_id: &HabitId) -> Result<Vec<CompletionEvent>, StorageError> {
        let state = self.state()?;
        Ok(state
            .completions
            .get(habit_id)
            .map(|days| days.values().rev().cloned().collect())
            .unwrap_or_default())
    }

    fn has_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError> {
        let state = self.state()?;
        Ok(state
            .completions
            .get(habit_id)
            .map_or(false, |days| days.contains_key(&day)))
    }

    fn upsert_completion(&self, event: &CompletionEvent) -> Result<bool, StorageError> {
        let mut state = self.state()?;
        Self::require_habit(&state, &event.habit_id)?;

        let days = state.completions.entry(event.habit_id.clone()).or_default();
        if days.contains_key(&event.day) {
            return Ok(false);
        }
        days.insert(event.day, event.clone());
        Ok(true)
    }

    fn delete_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError> {
        let mut state = self.state()?;
        Ok(state
            .completions
            .get_mut(habit_id)
            .map_or(false, |days| days.remove(&day).is_some()))
    }

    fn get_quantity(&self, habit_id: &HabitId, day: DayKey) -> Result<f64, StorageError> {
        let state = self.state()?;
        Ok(state.quantities.get(&(habit_id.clone(), day)).copied().unwrap_or(0.0))
    }

    fn list_quantities(&self, habit_id: &HabitId) -> Result<Vec<(DayKey, f64)>, StorageError> {
        let state = self.state()?;
        let mut days: Vec<(DayKey, f64)> = state
            .quantities
            .iter()
            .filter(|((id, _), _)| id == habit_id)
            .map(|((_, day), quantity)| (*day, *quantity))
            .collect();
        days.sort_by_key(|(day, _)| *day);
        Ok(days)
    }

    fn set_quantity(&self, habit_id: &HabitId, day: DayKey, value: f64) -> Result<(), StorageError> {
        let mut state = self.state()?;
        Self::require_habit(&state, habit_id)?;
        state.quantities.insert((habit_id.clone(), day), value);
        Ok(())
    }

    fn increment_quantity(&self, habit_id: &HabitId, day: DayKey, delta: f64) -> Result<f64, StorageError> {
        let mut state = self.state()?;
        Self::require_habit(&state, habit_id)?;

        let quantity = state.quantities.entry((habit_id.clone(), day)).or_insert(0.0);
        *quantity = (*quantity + delta).max(0.0);
        Ok(*quantity)
    }

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _gate = self
            .transaction_gate
            .lock()
            .map_err(|_| StorageError::Connection("memory store transaction gate poisoned".to_string()))?;

        let before = self.state()?.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(error) => {
                *self.state()? = before;
                Err(error)
            }
        }
    }
}
