/// Tool for deleting habits
///
/// This module implements the habit_delete MCP tool. Deletion is permanent
/// and takes the habit's completions and quantities with it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::Clock;
use crate::engine::{EngineError, StoreResultExt};
use crate::storage::HabitStore;
use crate::tools::{parse_habit_id, ToolContext};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DeleteHabitParams {
    /// ID of the habit to delete
    pub habit_id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteHabitResponse {
    pub success: bool,
    pub message: String,
}

pub fn delete_habit<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: DeleteHabitParams,
) -> Result<DeleteHabitResponse, EngineError> {
    let habit_id = parse_habit_id(&params.habit_id)?;

    let habit = ctx.storage.with_transaction(|store| -> Result<_, EngineError> {
        let habit = store.get_habit(&habit_id).during("get_habit")?;
        store.delete_habit(&habit_id).during("delete_habit")?;
        Ok(habit)
    })?;
    ctx.cache.invalidate(&habit_id);
    tracing::info!("Deleted habit '{}' ({})", habit.name, habit.id);

    Ok(DeleteHabitResponse {
        success: true,
        message: format!("🗑️ Deleted habit '{}' and its history", habit.name),
    })
}
