/// Tools for quantifiable habits
///
/// This module implements the habit_increment and habit_set_quantity MCP
/// tools. Reaching the target records the day as complete; dropping back
/// below it removes the completion again.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::{Clock, ProgressSnapshot};
use crate::engine::EngineError;
use crate::storage::HabitStore;
use crate::tools::{parse_day, parse_habit_id, ProgressResponse, ToolContext};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IncrementParams {
    /// ID of the habit
    pub habit_id: String,
    /// Amount to add; negative values subtract (the total never drops below 0)
    pub amount: f64,
    /// Local day (YYYY-MM-DD); defaults to today in the habit's timezone
    pub day: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetQuantityParams {
    /// ID of the habit
    pub habit_id: String,
    /// New total for the day, 0 or more
    pub value: f64,
    /// Local day (YYYY-MM-DD); defaults to today in the habit's timezone
    pub day: Option<String>,
}

fn quantity_headline(snapshot: &ProgressSnapshot) -> String {
    let current = snapshot.current_quantity.unwrap_or(0.0);
    let target = snapshot.target_quantity.unwrap_or(0.0);
    let status = if snapshot.completed_today { " 🎉 Target reached!" } else { "" };
    format!(
        "📈 Today: {} / {} ({:.0}%){}",
        current, target, snapshot.progress_percent, status
    )
}

pub fn increment_quantity<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: IncrementParams,
) -> Result<ProgressResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let day = parse_day(params.day.as_deref())?;

    let update = ctx.evaluator().adjust_quantity(&habit_id, day, params.amount)?;
    ctx.cache.invalidate(&habit_id);

    let headline = match day {
        Some(day) if day != update.snapshot.day => format!("✅ Adjusted quantity for {} by {}", day, params.amount),
        _ => quantity_headline(&update.snapshot),
    };
    Ok(ProgressResponse::new(headline, update))
}

pub fn set_quantity<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: SetQuantityParams,
) -> Result<ProgressResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let day = parse_day(params.day.as_deref())?;

    let update = ctx.evaluator().set_quantity(&habit_id, day, params.value)?;
    ctx.cache.invalidate(&habit_id);

    let headline = match day {
        Some(day) if day != update.snapshot.day => format!("✅ Set quantity for {} to {}", day, params.value),
        _ => quantity_headline(&update.snapshot),
    };
    Ok(ProgressResponse::new(headline, update))
}
