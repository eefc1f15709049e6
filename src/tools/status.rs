/// Tool for checking habit status and streaks
///
/// This module implements the habit_status MCP tool. Snapshots are served
/// from the [`SnapshotCache`](crate::cache::SnapshotCache) while fresh.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, DayKey, Habit, ProgressSnapshot};
use crate::engine::{CompletionLedger, EngineError, StoreResultExt};
use crate::storage::HabitStore;
use crate::tools::{parse_day, parse_habit_id, plural, ToolContext};

const RECENT_DAYS: usize = 7;

/// Parameters for checking habit status
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StatusParams {
    /// ID of a specific habit (optional; shows all habits if omitted)
    pub habit_id: Option<String>,
    /// Day to evaluate (YYYY-MM-DD); defaults to today in each habit's timezone
    pub day: Option<String>,
    /// Include the most recent completed days
    pub include_recent: Option<bool>,
}

/// Information about a single habit's status
#[derive(Debug, Serialize)]
pub struct HabitStatus {
    pub habit_id: String,
    pub name: String,
    pub snapshot: ProgressSnapshot,
    /// Most recent completed days, newest first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_completions: Option<Vec<DayKey>>,
}

/// Response from checking habit status
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub habits: Vec<HabitStatus>,
    pub summary: String,
    pub message: String,
}

/// Get status for habits using the provided storage
pub fn get_habit_status<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: StatusParams,
) -> Result<StatusResponse, EngineError> {
    let day = parse_day(params.day.as_deref())?;
    let include_recent = params.include_recent.unwrap_or(false);

    let habits = match params.habit_id.as_deref() {
        Some(raw) => vec![ctx.storage.get_habit(&parse_habit_id(raw)?).during("get_habit")?],
        None => ctx.storage.list_habits().during("list_habits")?,
    };

    let mut statuses = Vec::with_capacity(habits.len());
    for habit in habits {
        let snapshot = cached_snapshot(ctx, &habit, day)?;
        let recent_completions = if include_recent {
            let mut days = CompletionLedger::new(ctx.storage).completed_days(&habit.id)?;
            days.truncate(RECENT_DAYS);
            Some(days)
        } else {
            None
        };
        statuses.push(HabitStatus {
            habit_id: habit.id.to_string(),
            name: habit.name,
            snapshot,
            recent_completions,
        });
    }

    let summary = if statuses.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let on_streak = statuses.iter().filter(|s| s.snapshot.current_streak > 0).count();
        let done = statuses.iter().filter(|s| s.snapshot.completed_today).count();
        format!(
            "📊 Status: {} of {} habits on a streak, {} done today",
            on_streak,
            statuses.len(),
            done
        )
    };

    let details = statuses
        .iter()
        .map(|s| {
            let snapshot = &s.snapshot;
            let noun = snapshot.frequency.period_noun();
            let mut line = format!(
                "🎯 {} ({}) on {}\n   Current streak: {} | Best: {} | Rate: {:.1}% | Progress: {:.0}%",
                s.name,
                s.habit_id,
                snapshot.day,
                plural(snapshot.current_streak, noun),
                plural(snapshot.best_streak, noun),
                snapshot.completion_rate,
                snapshot.progress_percent
            );
            if let (Some(current), Some(target)) = (snapshot.current_quantity, snapshot.target_quantity) {
                line.push_str(&format!("\n   Quantity: {} / {}", current, target));
            }
            if let Some(days) = &s.recent_completions {
                let days: Vec<String> = days.iter().map(DayKey::to_string).collect();
                line.push_str(&format!("\n   Recent: {}", days.join(", ")));
            }
            line.push_str(&format!("\n   💬 {}", snapshot.encouragement()));
            line
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(StatusResponse {
        message: format!("{}\n\n{}", summary, details),
        habits: statuses,
        summary,
    })
}

fn cached_snapshot<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    habit: &Habit,
    day: Option<DayKey>,
) -> Result<ProgressSnapshot, EngineError> {
    let now = ctx.clock.now();
    let evaluator = ctx.evaluator();
    let day = day.unwrap_or_else(|| evaluator.today_for(habit, now).day);

    if let Some(snapshot) = ctx.cache.get(&habit.id, day, now) {
        tracing::debug!("Snapshot cache hit for {} on {}", habit.id, day);
        return Ok(snapshot);
    }

    let snapshot = evaluator.snapshot(&habit.id, Some(day))?;
    ctx.cache.put(snapshot.clone(), now);
    Ok(snapshot)
}
