/// Per-day quantity accumulation for quantifiable habits

use crate::domain::{DayKey, Habit, HabitId, QuantityState};
use crate::engine::{require_quantifiable, EngineError, StoreResultExt};
use crate::storage::HabitStore;

pub struct QuantityAccumulator<'a, S: HabitStore> {
    store: &'a S,
}

impl<'a, S: HabitStore> QuantityAccumulator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Add `delta` to the day's quantity, clamping at zero
    ///
    /// The addition happens inside the store so concurrent increments are
    /// never lost.
    pub fn increment(&self, habit: &Habit, day: DayKey, delta: f64) -> Result<f64, EngineError> {
        require_quantifiable(habit, "increment")?;
        if !delta.is_finite() {
            return Err(EngineError::invalid_argument(format!(
                "Quantity delta must be a finite number, got {}",
                delta
            )));
        }

        let current = self.get_quantity(&habit.id, day)?;
        if !(current + delta).is_finite() {
            return Err(overflow(current, delta));
        }

        let quantity = self
            .store
            .increment_quantity(&habit.id, day, delta)
            .during("increment_quantity")?;
        if !quantity.is_finite() {
            return Err(overflow(current, delta));
        }
        tracing::debug!("Quantity for {} on {} is now {}", habit.id, day, quantity);
        Ok(quantity)
    }

    /// Overwrite the day's quantity
    pub fn set_quantity(&self, habit: &Habit, day: DayKey, value: f64) -> Result<(), EngineError> {
        require_quantifiable(habit, "set_quantity")?;
        if !value.is_finite() || value < 0.0 {
            return Err(EngineError::invalid_argument(format!(
                "Quantity must be a non-negative number, got {}",
                value
            )));
        }

        self.store.set_quantity(&habit.id, day, value).during("set_quantity")
    }

    pub fn get_quantity(&self, habit_id: &HabitId, day: DayKey) -> Result<f64, EngineError> {
        self.store.get_quantity(habit_id, day).during("get_quantity")
    }

    pub fn state(&self, habit_id: &HabitId, day: DayKey) -> Result<QuantityState, EngineError> {
        Ok(QuantityState {
            habit_id: habit_id.clone(),
            day,
            current_quantity: self.get_quantity(habit_id, day)?,
        })
    }
}

fn overflow(current: f64, delta: f64) -> EngineError {
    EngineError::invalid_argument(format!(
        "Adding {} to {} overflows the quantity",
        delta, current
    ))
}
