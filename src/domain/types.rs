/// Core types and enums used throughout the domain layer
///
/// This module defines the identifier, cadence and habit-kind types that
/// Habit, CompletionEvent and the progress computations are built on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

/// Unique identifier for a habit
///
/// This is a wrapper around UUID to provide type safety - a raw string or
/// another UUID can't be passed where a habit ID is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HabitId(pub Uuid);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a habit ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for HabitId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The cadence a completion must satisfy to keep a streak alive
///
/// One completion anywhere inside the period is enough. Weekly periods are
/// rolling 7-day windows ending on the evaluation day; monthly periods are
/// calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Stable lowercase name, used for storage and tool output
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// Singular noun for one period ("day", "week", "month")
    pub fn period_noun(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(DomainError::InvalidFrequency(format!(
                "'{}' is not one of: daily, weekly, monthly",
                other
            ))),
        }
    }
}

/// Whether a habit is completed by a direct "mark done" or by reaching
/// a numeric target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HabitKind {
    /// Completed by marking the day done
    Boolean,
    /// Completed once the day's accumulated quantity reaches the target
    Quantifiable {
        target_quantity: f64,
        /// Display label only (e.g. "glasses", "pages")
        unit: Option<String>,
    },
}

impl HabitKind {
    /// Build a validated quantifiable kind
    pub fn quantifiable(target_quantity: f64, unit: Option<String>) -> Result<Self, DomainError> {
        let kind = HabitKind::Quantifiable { target_quantity, unit };
        kind.validate()?;
        Ok(kind)
    }

    pub fn is_quantifiable(&self) -> bool {
        matches!(self, HabitKind::Quantifiable { .. })
    }

    /// The target for quantifiable habits, `None` for boolean ones
    pub fn target_quantity(&self) -> Option<f64> {
        match self {
            HabitKind::Boolean => None,
            HabitKind::Quantifiable { target_quantity, .. } => Some(*target_quantity),
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            HabitKind::Boolean => None,
            HabitKind::Quantifiable { unit, .. } => unit.as_deref(),
        }
    }

    /// Check the target is a positive finite number and the unit is sensible
    pub fn validate(&self) -> Result<(), DomainError> {
        if let HabitKind::Quantifiable { target_quantity, unit } = self {
            if !target_quantity.is_finite() || *target_quantity <= 0.0 {
                return Err(DomainError::InvalidValue {
                    message: format!("Target quantity must be a positive number, got {}", target_quantity),
                });
            }

            if let Some(unit_str) = unit {
                let trimmed = unit_str.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::InvalidValue {
                        message: "Unit cannot be empty if specified".to_string(),
                    });
                }
                if trimmed.len() > 20 {
                    return Err(DomainError::InvalidValue {
                        message: "Unit cannot be longer than 20 characters".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!(" Weekly ".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert_eq!("MONTHLY".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!("weekdays".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_quantifiable_kind_requires_positive_target() {
        assert!(HabitKind::quantifiable(8.0, Some("glasses".to_string())).is_ok());
        assert!(HabitKind::quantifiable(0.0, None).is_err());
        assert!(HabitKind::quantifiable(-3.0, None).is_err());
        assert!(HabitKind::quantifiable(f64::NAN, None).is_err());
        assert!(HabitKind::quantifiable(5.0, Some("  ".to_string())).is_err());
    }

    #[test]
    fn test_kind_serializes_with_tag() {
        let kind = HabitKind::quantifiable(8.0, Some("glasses".to_string())).unwrap();
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["kind"], "quantifiable");
        assert_eq!(json["target_quantity"], 8.0);

        let boolean = serde_json::to_value(&HabitKind::Boolean).unwrap();
        assert_eq!(boolean["kind"], "boolean");
    }

    #[test]
    fn test_habit_id_round_trips_through_string() {
        let id = HabitId::new();
        let parsed = HabitId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(HabitId::from_string("not-a-uuid").is_err());
    }
}
