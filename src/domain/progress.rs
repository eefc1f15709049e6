/// Progress snapshots and streak milestones
///
/// A snapshot is the read-only view of a habit's progress on one day. It is
/// always derived from the habit, its completed days and (for quantifiable
/// habits) the day's quantity; it is never the system of record.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{
    compute_streaks, days_between, DayKey, DomainError, Frequency, Habit, HabitId, HabitKind,
    QuantityState,
};

/// Inputs to a snapshot beyond the habit itself
#[derive(Debug, Clone)]
pub struct SnapshotInputs<'a> {
    /// The day being evaluated
    pub today: DayKey,
    /// The habit's local creation day
    pub created_on: DayKey,
    /// Every day in the ledger, any order
    pub completed_days: &'a [DayKey],
    /// Today's quantity, for quantifiable habits
    pub quantity_today: Option<&'a QuantityState>,
    /// Trailing window for the completion rate, in days
    pub rate_window_days: u32,
}

/// Derived progress for one habit on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub habit_id: HabitId,
    pub day: DayKey,
    pub frequency: Frequency,
    pub completed_today: bool,
    /// Consecutive cadence periods with a completion
    pub current_streak: u32,
    pub best_streak: u32,
    /// Share of days completed in the trailing window, 0-100
    pub completion_rate: f64,
    /// Progress toward today's completion, 0-100
    pub progress_percent: f64,
    /// Today's quantity, quantifiable habits only
    pub current_quantity: Option<f64>,
    pub target_quantity: Option<f64>,
}

impl ProgressSnapshot {
    /// Derive a snapshot
    ///
    /// For quantifiable habits today's completion comes from the quantity,
    /// not the ledger, so a target met today counts toward the streak even
    /// before anything is written and a stale entry for today doesn't.
    pub fn compute(habit: &Habit, inputs: SnapshotInputs<'_>) -> Result<Self, DomainError> {
        let today = inputs.today;
        let in_ledger_today = inputs.completed_days.contains(&today);

        let (completed_today, progress_percent, current_quantity) = match &habit.kind {
            HabitKind::Boolean => {
                let percent = if in_ledger_today { 100.0 } else { 0.0 };
                (in_ledger_today, percent, None)
            }
            HabitKind::Quantifiable { target_quantity, .. } => {
                let quantity = inputs.quantity_today.map(|q| q.current_quantity).unwrap_or(0.0);
                if !quantity.is_finite() || quantity < 0.0 {
                    return Err(DomainError::InvariantViolation(format!(
                        "quantity for {} on {} is {}",
                        habit.id, today, quantity
                    )));
                }
                let done = inputs
                    .quantity_today
                    .map(|q| q.meets(*target_quantity))
                    .unwrap_or(false);
                let percent = (100.0 * quantity / target_quantity).min(100.0);
                (done, percent, Some(quantity))
            }
        };

        let mut days: BTreeSet<DayKey> = inputs
            .completed_days
            .iter()
            .copied()
            .filter(|day| *day != today)
            .collect();
        if completed_today {
            days.insert(today);
        }

        let streaks = compute_streaks(habit.frequency, days.iter().copied(), today);
        if streaks.best < streaks.current {
            return Err(DomainError::InvariantViolation(format!(
                "best streak {} below current streak {} for {}",
                streaks.best, streaks.current, habit.id
            )));
        }

        Ok(Self {
            habit_id: habit.id.clone(),
            day: today,
            frequency: habit.frequency,
            completed_today,
            current_streak: streaks.current,
            best_streak: streaks.best,
            completion_rate: completion_rate(&days, today, inputs.created_on, inputs.rate_window_days),
            progress_percent,
            current_quantity,
            target_quantity: habit.kind.target_quantity(),
        })
    }

    /// Get an encouraging message based on the current streak
    pub fn encouragement(&self) -> String {
        let unit = self.frequency.period_noun();
        match self.current_streak {
            0 => "Ready to start your streak! Every journey begins with a single step.".to_string(),
            1 => format!("Great start! One {} down, keep the momentum going.", unit),
            2..=6 => format!("Nice work! {} {}s in a row. You're building a strong habit.", self.current_streak, unit),
            7..=13 => format!("Excellent! {} {}s strong. You're in the groove now!", self.current_streak, unit),
            14..=29 => format!("Amazing! {} {}s straight. This is becoming second nature.", self.current_streak, unit),
            30..=99 => format!("Incredible! {} {}s of consistency. You're a habit master!", self.current_streak, unit),
            _ => format!("Legendary! {} {}s of unwavering commitment. You're an inspiration!", self.current_streak, unit),
        }
    }
}

/// Percentage of days completed in `[max(today - window + 1, created_on), today]`
///
/// Habits younger than the window are measured over their own lifetime.
pub fn completion_rate(days: &BTreeSet<DayKey>, today: DayKey, created_on: DayKey, window_days: u32) -> f64 {
    let window = i64::from(window_days.max(1));
    let earliest = today.offset_days(-(window - 1));
    let start = created_on.max(earliest).min(today);

    let span = days_between(start, today) + 1;
    let hits = days.range(start..=today).count();
    hits as f64 * 100.0 / span as f64
}

/// A streak threshold crossed by a mutation, for the caller to hand to a
/// notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakMilestone {
    pub threshold: u32,
    pub streak: u32,
    pub frequency: Frequency,
}

impl StreakMilestone {
    /// The highest threshold in `thresholds` that `after` reaches and
    /// `before` didn't
    pub fn crossed(before: u32, after: u32, thresholds: &[u32], frequency: Frequency) -> Option<Self> {
        thresholds
            .iter()
            .copied()
            .filter(|t| *t > 0 && before < *t && after >= *t)
            .max()
            .map(|threshold| Self { threshold, streak: after, frequency })
    }

    pub fn message(&self) -> String {
        format!(
            "🏆 Milestone reached: {} {} streak!",
            self.threshold,
            self.frequency.period_noun()
        )
    }
}

/// Result of a mutating engine operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Freshly computed snapshot for the habit's current day
    pub snapshot: ProgressSnapshot,
    pub milestone: Option<StreakMilestone>,
}
