/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, Frequency, Habit, HabitKind};
use crate::engine::{EngineError, StoreResultExt};
use crate::storage::HabitStore;
use crate::tools::ToolContext;

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    /// Name of the habit
    pub name: String,
    /// daily, weekly or monthly (default: daily)
    pub frequency: Option<String>,
    /// Daily target; makes the habit quantifiable (e.g. 8 for 8 glasses of water)
    pub target_quantity: Option<f64>,
    /// Unit for the target (e.g. "glasses", "minutes")
    pub unit: Option<String>,
    /// IANA timezone the habit's days are counted in (e.g. "Europe/Berlin")
    pub timezone: Option<String>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit_id: String,
    pub message: String,
}

/// Create a new habit using the provided storage
pub fn create_habit<S: HabitStore, C: Clock>(
    ctx: &ToolContext<'_, S, C>,
    params: CreateHabitParams,
) -> Result<CreateHabitResponse, EngineError> {
    let frequency = match params.frequency.as_deref() {
        Some(raw) => raw.parse::<Frequency>()?,
        None => Frequency::Daily,
    };

    let kind = match (params.target_quantity, params.unit) {
        (Some(target), unit) => HabitKind::quantifiable(target, unit)?,
        (None, Some(_)) => {
            return Err(EngineError::invalid_argument("A unit needs a target_quantity"));
        }
        (None, None) => HabitKind::Boolean,
    };

    let habit = Habit::new(params.name, frequency, kind, params.timezone, ctx.clock.now())?;
    ctx.storage.create_habit(&habit).during("create_habit")?;
    tracing::info!("Created habit '{}' ({})", habit.name, habit.id);

    let target = habit
        .target_display()
        .map(|t| format!(" Target: {} per {}.", t, habit.frequency.period_noun()))
        .unwrap_or_default();

    Ok(CreateHabitResponse {
        success: true,
        habit_id: habit.id.to_string(),
        message: format!(
            "✅ Created {} habit '{}'!{} Ready to start your streak!",
            habit.frequency, habit.name, target
        ),
    })
}
