/// MCP tools for habit management
///
/// Each tool takes its deserialized parameters and a [`ToolContext`] and
/// returns a serializable response carrying a human-readable message.
/// Mutating tools invalidate the habit's cached snapshots on success.

pub mod create;
pub mod list;
pub mod update;
pub mod delete;
pub mod log;
pub mod quantity;
pub mod status;

pub use create::*;
pub use list::*;
pub use update::*;
pub use delete::*;
pub use log::*;
pub use quantity::*;
pub use status::*;

use crate::cache::SnapshotCache;
use crate::config::EngineConfig;
use crate::domain::{Clock, DayKey, HabitId};
use crate::engine::{EngineError, ProgressEvaluator};
use crate::storage::HabitStore;

/// Everything a tool call needs
pub struct ToolContext<'a, S: HabitStore, C: Clock> {
    pub storage: &'a S,
    pub clock: &'a C,
    pub config: &'a EngineConfig,
    pub cache: &'a SnapshotCache,
}

impl<'a, S: HabitStore, C: Clock> ToolContext<'a, S, C> {
    pub fn evaluator(&self) -> ProgressEvaluator<'a, S, C> {
        ProgressEvaluator::new(self.storage, self.clock, self.config)
    }
}

pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, EngineError> {
    HabitId::from_string(raw)
        .map_err(|_| EngineError::invalid_argument(format!("'{}' is not a valid habit ID", raw.trim())))
}

/// Parse an optional `YYYY-MM-DD` day
pub(crate) fn parse_day(raw: Option<&str>) -> Result<Option<DayKey>, EngineError> {
    Ok(raw.map(str::parse::<DayKey>).transpose()?)
}

/// "1 day", "3 weeks"
pub(crate) fn plural(count: u32, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
