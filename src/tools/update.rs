/// Tool for updating existing habits
///
/// This module implements the habit_update MCP tool. A frequency change
/// applies to the habit's whole history: streaks are recomputed under the
/// new cadence the next time a snapshot is taken. A target change re-judges
/// every recorded quantity, so the completion ledger stays in step.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, Frequency};
use crate::engine::evaluator::resync_ledger;
use crate::engine::{EngineError, StoreResultExt};
use crate::storage::HabitStore;
use crate::tools::{parse_habit_id, ToolContext};

/// Parameters for updating an existing habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    /// ID of the habit to update
    pub habit_id: String,
    pub name: Option<String>,
    /// daily, weekly or monthly
    pub frequency: Option<String>,
    /// IANA timezone; an empty string reverts to the server default
    pub timezone: Option<String>,
    /// New target, quantifiable habits only
    pub target_quantity: Option<f64>,
    /// New unit, quantifiable habits only; an empty string clears it
    pub unit: Option<String>,
}

/// Response from updating a habit
#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub message: String,
}

/// Update an existing habit using the provided storage
pub fn update_habit<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: UpdateHabitParams,
) -> Result<UpdateHabitResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;
    let frequency = params.frequency.as_deref().map(str::parse::<Frequency>).transpose()?;
    let unit = params
        .unit
        .map(|unit| if unit.trim().is_empty() { None } else { Some(unit) });

    let target_changed = params.target_quantity.is_some();
    let now = ctx.clock.now();

    let habit = ctx.storage.with_transaction(|store| -> Result<_, EngineError> {
        let mut habit = store.get_habit(&habit_id).during("get_habit")?;
        habit.update(params.name, frequency, params.timezone.map(Some), params.target_quantity, unit)?;
        store.update_habit(&habit).during("update_habit")?;
        // Recorded quantities are judged against the new target
        if target_changed {
            resync_ledger(store, &habit, now)?;
        }
        Ok(habit)
    })?;
    ctx.cache.invalidate(&habit.id);
    tracing::info!("Updated habit '{}' ({})", habit.name, habit.id);

    Ok(UpdateHabitResponse {
        success: true,
        message: format!("✅ Updated habit '{}'", habit.name),
    })
}
