/// Tools for marking boolean habits done
///
/// This module implements the habit_complete and habit_undo MCP tools, and
/// the progress response shared with the quantity tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, ProgressSnapshot, ProgressUpdate, StreakMilestone};
use crate::engine::EngineError;
use crate::storage::HabitStore;
use crate::tools::{parse_day, parse_habit_id, plural, ToolContext};

/// Parameters for marking a habit done or undoing it
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteHabitParams {
    /// ID of the habit
    pub habit_id: String,
    /// Local day (YYYY-MM-DD); defaults to today in the habit's timezone
    pub day: Option<String>,
}

/// Response from any progress-changing tool
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub snapshot: ProgressSnapshot,
    pub milestone: Option<StreakMilestone>,
    pub message: String,
}

impl ProgressResponse {
    pub(crate) fn new(headline: String, update: ProgressUpdate) -> Self {
        let snapshot = update.snapshot;
        let noun = snapshot.frequency.period_noun();

        let mut message = format!(
            "{}\n🔥 Current streak: {} (best: {})\n💬 {}",
            headline,
            plural(snapshot.current_streak, noun),
            plural(snapshot.best_streak, noun),
            snapshot.encouragement()
        );
        if let Some(milestone) = &update.milestone {
            message.push('\n');
            message.push_str(&milestone.message());
        }

        Self { success: true, snapshot, milestone: update.milestone, message }
    }
}

/// Mark a boolean habit done
pub fn complete_habit<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: CompleteHabitParams,
) -> Result<ProgressResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let day = parse_day(params.day.as_deref())?;

    let update = ctx.evaluator().mark_complete(&habit_id, day)?;
    ctx.cache.invalidate(&habit_id);

    let headline = format!("✅ Logged completion for {}", day.unwrap_or(update.snapshot.day));
    Ok(ProgressResponse::new(headline, update))
}

/// Remove a boolean habit's completion
pub fn undo_completion<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: CompleteHabitParams,
) -> Result<ProgressResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let day = parse_day(params.day.as_deref())?;

    let update = ctx.evaluator().mark_incomplete(&habit_id, day)?;
    ctx.cache.invalidate(&habit_id);

    let headline = format!("↩️ Removed completion for {}", day.unwrap_or(update.snapshot.day));
    Ok(ProgressResponse::new(headline, update))
}
