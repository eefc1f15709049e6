/// Process-wide engine configuration
///
/// Built from command line flags in `main.rs`; everything has a default so
/// library users and tests can start from `EngineConfig::default()`.

use std::time::Duration;

use chrono_tz::Tz;

use crate::domain::{parse_timezone, DomainError};

/// Streak lengths that produce a milestone event
pub const DEFAULT_MILESTONES: [u32; 3] = [7, 30, 100];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Zone used for habits that don't name their own
    pub default_timezone: Tz,
    /// Trailing window for the completion rate
    pub completion_rate_window_days: u32,
    /// Streak thresholds reported as milestones, in cadence periods
    pub milestone_thresholds: Vec<u32>,
    /// How long a cached snapshot may be served
    pub snapshot_cache_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timezone: chrono_tz::UTC,
            completion_rate_window_days: 30,
            milestone_thresholds: DEFAULT_MILESTONES.to_vec(),
            snapshot_cache_ttl: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Set the default zone by IANA name; unknown names are rejected
    pub fn with_default_timezone(mut self, name: &str) -> Result<Self, DomainError> {
        self.default_timezone = parse_timezone(name)?;
        Ok(self)
    }

    pub fn with_rate_window(mut self, days: u32) -> Result<Self, DomainError> {
        if days == 0 || days > 366 {
            return Err(DomainError::InvalidValue {
                message: format!("Completion rate window must be 1-366 days, got {}", days),
            });
        }
        self.completion_rate_window_days = days;
        Ok(self)
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.snapshot_cache_ttl = ttl;
        self
    }

    pub fn with_milestones(mut self, thresholds: Vec<u32>) -> Self {
        self.milestone_thresholds = thresholds;
        self
    }
}
