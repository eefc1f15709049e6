/// Tool for listing all habits
///
/// This module implements the habit_list MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, ProgressSnapshot};
use crate::engine::{EngineError, StoreResultExt};
use crate::storage::HabitStore;
use crate::tools::{plural, ToolContext};

/// Parameters for listing habits
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    /// Sort by: name, streak, completion_rate or created (default: created, newest first)
    pub sort_by: Option<String>,
}

/// Information about a habit in the list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub frequency: String,
    pub target: Option<String>,
    pub timezone: Option<String>,
    pub snapshot: ProgressSnapshot,
}

/// Summary statistics for all habits
#[derive(Debug, Serialize)]
pub struct HabitListSummary {
    pub total_habits: usize,
    pub completed_today: usize,
    pub avg_completion_rate: f64,
}

/// Response from listing habits
#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub habits: Vec<HabitSummary>,
    pub summary: HabitListSummary,
    pub message: String,
}

/// List habits with today's snapshot for each
pub fn list_habits<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, EngineError> {
    let evaluator = ctx.evaluator();
    let mut habits = Vec::new();

    for habit in ctx.storage.list_habits().during("list_habits")? {
        let snapshot = evaluator.snapshot_of(&habit)?;
        habits.push(HabitSummary {
            habit_id: habit.id.to_string(),
            target: habit.target_display(),
            frequency: habit.frequency.to_string(),
            name: habit.name,
            timezone: habit.timezone,
            snapshot,
        });
    }

    match params.sort_by.as_deref().map(str::trim) {
        None | Some("") | Some("created") => {}
        Some("name") => habits.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        Some("streak") => habits.sort_by(|a, b| b.snapshot.current_streak.cmp(&a.snapshot.current_streak)),
        Some("completion_rate") => {
            habits.sort_by(|a, b| b.snapshot.completion_rate.total_cmp(&a.snapshot.completion_rate))
        }
        Some(other) => {
            return Err(EngineError::invalid_argument(format!(
                "Invalid sort_by '{}'. Valid options: name, streak, completion_rate, created",
                other
            )));
        }
    }

    let total_habits = habits.len();
    let completed_today = habits.iter().filter(|h| h.snapshot.completed_today).count();
    let avg_completion_rate = if total_habits == 0 {
        0.0
    } else {
        habits.iter().map(|h| h.snapshot.completion_rate).sum::<f64>() / total_habits as f64
    };

    let message = if habits.is_empty() {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let lines = habits
            .iter()
            .map(|h| {
                format!(
                    "🎯 **{}** ({})\n   📅 {} | 🔥 Streak: {} | 🏅 Best: {} | 📊 Rate: {:.1}%{}",
                    h.name,
                    h.habit_id,
                    h.frequency,
                    plural(h.snapshot.current_streak, h.snapshot.frequency.period_noun()),
                    h.snapshot.best_streak,
                    h.snapshot.completion_rate,
                    if h.snapshot.completed_today { " | ✅ done today" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "📋 **Habit Summary** ({} habits, {} done today)\n\n{}\n\n📊 Average completion rate: {:.1}%",
            total_habits, completed_today, lines, avg_completion_rate
        )
    };

    Ok(ListHabitsResponse {
        habits,
        summary: HabitListSummary { total_habits, completed_today, avg_completion_rate },
        message,
    })
}
