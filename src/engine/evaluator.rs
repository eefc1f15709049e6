/// Progress evaluator
///
/// Entry point for completion and quantity events. Each mutation reads the
/// habit, applies its writes and recomputes the snapshot inside a single
/// store transaction, so a failure part-way leaves nothing behind.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;
use crate::domain::{
    day_in_zone, Clock, DayBucket, DayKey, Habit, HabitId, ProgressSnapshot, ProgressUpdate,
    SnapshotInputs, StreakMilestone,
};
use crate::engine::{
    require_boolean, require_quantifiable, CompletionLedger, EngineError, QuantityAccumulator,
    StoreResultExt,
};
use crate::storage::HabitStore;

pub struct ProgressEvaluator<'a, S: HabitStore, C: Clock> {
    store: &'a S,
    clock: &'a C,
    config: &'a EngineConfig,
}

impl<'a, S: HabitStore, C: Clock> ProgressEvaluator<'a, S, C> {
    pub fn new(store: &'a S, clock: &'a C, config: &'a EngineConfig) -> Self {
        Self { store, clock, config }
    }

    /// Bucket `now` into the habit's local day
    pub fn today_for(&self, habit: &Habit, now: DateTime<Utc>) -> DayBucket {
        let zone = habit.zone(self.config.default_timezone);
        DayBucket {
            day: day_in_zone(now, zone.tz),
            fell_back_to_utc: zone.fell_back_to_utc,
        }
    }

    /// The habit's current local day according to the clock
    pub fn today(&self, habit_id: &HabitId) -> Result<DayBucket, EngineError> {
        let habit = self.store.get_habit(habit_id).during("get_habit")?;
        Ok(self.today_for(&habit, self.clock.now()))
    }

    /// Derive the snapshot for `today`, or for the habit's current day
    pub fn snapshot(&self, habit_id: &HabitId, today: Option<DayKey>) -> Result<ProgressSnapshot, EngineError> {
        let habit = self.store.get_habit(habit_id).during("get_habit")?;
        let today = today.unwrap_or_else(|| self.today_for(&habit, self.clock.now()).day);
        self.snapshot_in(self.store, &habit, today)
    }

    /// Snapshot for a habit already loaded by the caller, on its current day
    pub fn snapshot_of(&self, habit: &Habit) -> Result<ProgressSnapshot, EngineError> {
        let today = self.today_for(habit, self.clock.now()).day;
        self.snapshot_in(self.store, habit, today)
    }

    /// Mark a boolean habit done for `day` (default: today)
    pub fn mark_complete(&self, habit_id: &HabitId, day: Option<DayKey>) -> Result<ProgressUpdate, EngineError> {
        self.mutate(habit_id, "mark_complete", day, |store, habit, day, now| {
            require_boolean(habit, "mark_complete")?;
            CompletionLedger::new(store).record_completion(&habit.id, day, now)?;
            Ok(())
        })
    }

    /// Undo a completion on a boolean habit
    pub fn mark_incomplete(&self, habit_id: &HabitId, day: Option<DayKey>) -> Result<ProgressUpdate, EngineError> {
        self.mutate(habit_id, "mark_incomplete", day, |store, habit, day, _| {
            require_boolean(habit, "mark_incomplete")?;
            CompletionLedger::new(store).remove_completion(&habit.id, day)?;
            Ok(())
        })
    }

    /// Add `delta` (possibly negative) to a quantifiable habit's day total
    pub fn adjust_quantity(
        &self,
        habit_id: &HabitId,
        day: Option<DayKey>,
        delta: f64,
    ) -> Result<ProgressUpdate, EngineError> {
        self.mutate(habit_id, "adjust_quantity", day, |store, habit, day, now| {
            let target = require_quantifiable(habit, "adjust_quantity")?;
            let quantity = QuantityAccumulator::new(store).increment(habit, day, delta)?;
            sync_ledger(store, habit, day, quantity, target, now)
        })
    }

    /// Overwrite a quantifiable habit's day total
    pub fn set_quantity(
        &self,
        habit_id: &HabitId,
        day: Option<DayKey>,
        value: f64,
    ) -> Result<ProgressUpdate, EngineError> {
        self.mutate(habit_id, "set_quantity", day, |store, habit, day, now| {
            let target = require_quantifiable(habit, "set_quantity")?;
            QuantityAccumulator::new(store).set_quantity(habit, day, value)?;
            sync_ledger(store, habit, day, value, target, now)
        })
    }

    fn mutate<F>(
        &self,
        habit_id: &HabitId,
        operation: &'static str,
        day: Option<DayKey>,
        apply: F,
    ) -> Result<ProgressUpdate, EngineError>
    where
        F: FnOnce(&S, &Habit, DayKey, DateTime<Utc>) -> Result<(), EngineError>,
    {
        let now = self.clock.now();
        let update = self.store.with_transaction(|store| -> Result<ProgressUpdate, EngineError> {
            let habit = store.get_habit(habit_id).during("get_habit")?;
            let today = self.today_for(&habit, now).day;
            let day = match day {
                Some(day) if day > today => {
                    return Err(EngineError::invalid_argument(format!(
                        "{} is in the future for this habit (today is {})",
                        day, today
                    )));
                }
                Some(day) => day,
                None => today,
            };

            let before = self.snapshot_in(store, &habit, today)?;
            apply(store, &habit, day, now)?;
            let snapshot = self.snapshot_in(store, &habit, today)?;

            let milestone = StreakMilestone::crossed(
                before.current_streak,
                snapshot.current_streak,
                &self.config.milestone_thresholds,
                habit.frequency,
            );
            Ok(ProgressUpdate { snapshot, milestone })
        })?;

        tracing::info!(
            "{} on habit {}: streak {}, completed today {}",
            operation,
            habit_id,
            update.snapshot.current_streak,
            update.snapshot.completed_today
        );
        if let Some(milestone) = &update.milestone {
            tracing::info!("Habit {} reached the {} streak milestone", habit_id, milestone.threshold);
        }
        Ok(update)
    }

    fn snapshot_in(&self, store: &S, habit: &Habit, today: DayKey) -> Result<ProgressSnapshot, EngineError> {
        let completed_days = CompletionLedger::new(store).completed_days(&habit.id)?;
        let quantity_today = if habit.is_quantifiable() {
            Some(QuantityAccumulator::new(store).state(&habit.id, today)?)
        } else {
            None
        };

        let inputs = SnapshotInputs {
            today,
            created_on: habit.created_on(self.config.default_timezone),
            completed_days: &completed_days,
            quantity_today: quantity_today.as_ref(),
            rate_window_days: self.config.completion_rate_window_days,
        };
        Ok(ProgressSnapshot::compute(habit, inputs)?)
    }
}

/// Re-derive the ledger for every day of a quantifiable habit after its
/// target changed. Days with a completion but no stored quantity count as
/// zero. Returns the number of days whose ledger entry changed.
pub(crate) fn resync_ledger<S: HabitStore>(
    store: &S,
    habit: &Habit,
    now: DateTime<Utc>,
) -> Result<usize, EngineError> {
    let target = match habit.kind.target_quantity() {
        Some(target) => target,
        None => return Ok(0),
    };

    let ledger = CompletionLedger::new(store);
    let mut quantities: BTreeMap<DayKey, f64> = store
        .list_quantities(&habit.id)
        .during("list_quantities")?
        .into_iter()
        .collect();
    for day in ledger.completed_days(&habit.id)? {
        quantities.entry(day).or_insert(0.0);
    }

    let mut changed = 0;
    for (day, quantity) in quantities {
        let had = ledger.has_completion(&habit.id, day)?;
        sync_ledger(store, habit, day, quantity, target, now)?;
        if had != (quantity >= target) {
            changed += 1;
        }
    }

    if changed > 0 {
        tracing::info!("Re-synced {} ledger day(s) for habit {} against target {}", changed, habit.id, target);
    }
    Ok(changed)
}

/// Keep the ledger entry for `day` in line with whether the target is met
fn sync_ledger<S: HabitStore>(
    store: &S,
    habit: &Habit,
    day: DayKey,
    quantity: f64,
    target: f64,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let ledger = CompletionLedger::new(store);
    if quantity >= target {
        ledger.record_completion(&habit.id, day, now)?;
    } else {
        ledger.remove_completion(&habit.id, day)?;
    }
    Ok(())
}
