/// Habit entity and related functionality
///
/// This module defines the Habit struct that represents a behavior the user
/// tracks, along with its validation rules.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::domain::{
    day_in_zone, parse_timezone, resolve_timezone, DayKey, DomainError, Frequency, HabitId,
    HabitKind, ResolvedZone,
};

/// A habit represents something the user wants to do regularly
///
/// Each habit has a cadence, a kind (boolean or quantifiable with a
/// target), and optionally its own timezone for day boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Drink water", "Read")
    pub name: String,
    /// Cadence a completion must satisfy to extend a streak
    pub frequency: Frequency,
    /// How completion is decided
    pub kind: HabitKind,
    /// IANA zone for day boundaries; `None` means the process default
    pub timezone: Option<String>,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// The creation instant is passed in rather than read from the clock.
    pub fn new(
        name: String,
        frequency: Frequency,
        kind: HabitKind,
        timezone: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = Self::validate_name(&name)?;
        kind.validate()?;
        let timezone = Self::validate_timezone(timezone)?;

        Ok(Self {
            id: HabitId::new(),
            name,
            frequency,
            kind,
            timezone,
            created_at,
        })
    }

    /// Create a habit from existing data (used when loading from database)
    ///
    /// This constructor assumes data is already validated. A stored zone
    /// that is no longer recognized is tolerated here and falls back to UTC
    /// when days are bucketed.
    pub fn from_existing(
        id: HabitId,
        name: String,
        frequency: Frequency,
        kind: HabitKind,
        timezone: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            frequency,
            kind,
            timezone,
            created_at,
        }
    }

    /// Update the habit's properties with validation
    ///
    /// Nothing is applied unless every provided value is valid. The habit's
    /// kind cannot be switched; only a quantifiable habit's target and unit
    /// can change.
    pub fn update(
        &mut self,
        name: Option<String>,
        frequency: Option<Frequency>,
        timezone: Option<Option<String>>,
        target_quantity: Option<f64>,
        unit: Option<Option<String>>,
    ) -> Result<(), DomainError> {
        let name = name.map(|n| Self::validate_name(&n)).transpose()?;
        let timezone = timezone.map(Self::validate_timezone).transpose()?;

        let kind = match (&self.kind, target_quantity, unit) {
            (_, None, None) => None,
            (HabitKind::Boolean, _, _) => {
                return Err(DomainError::Validation {
                    message: "Only quantifiable habits have a target quantity or unit".to_string(),
                });
            }
            (HabitKind::Quantifiable { target_quantity: current_target, unit: current_unit }, target, unit) => {
                let kind = HabitKind::Quantifiable {
                    target_quantity: target.unwrap_or(*current_target),
                    unit: unit.unwrap_or_else(|| current_unit.clone()),
                };
                kind.validate()?;
                Some(kind)
            }
        };

        if let Some(new_name) = name {
            self.name = new_name;
        }
        if let Some(new_frequency) = frequency {
            self.frequency = new_frequency;
        }
        if let Some(new_timezone) = timezone {
            self.timezone = new_timezone;
        }
        if let Some(new_kind) = kind {
            self.kind = new_kind;
        }

        Ok(())
    }

    pub fn is_quantifiable(&self) -> bool {
        self.kind.is_quantifiable()
    }

    /// Get a display string for the target (e.g., "8 glasses")
    pub fn target_display(&self) -> Option<String> {
        match (self.kind.target_quantity(), self.kind.unit()) {
            (Some(value), Some(unit)) => Some(format!("{} {}", value, unit)),
            (Some(value), None) => Some(value.to_string()),
            _ => None,
        }
    }

    /// The zone this habit's days are bucketed in
    pub fn zone(&self, default: Tz) -> ResolvedZone {
        match &self.timezone {
            Some(name) => resolve_timezone(name),
            None => ResolvedZone { tz: default, fell_back_to_utc: false },
        }
    }

    /// The local day the habit was created on
    pub fn created_on(&self, default: Tz) -> DayKey {
        day_in_zone(self.created_at, self.zone(default).tz)
    }

    // Validation helper methods

    /// Validate habit name, returning the trimmed form
    fn validate_name(name: &str) -> Result<String, DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string()
            ));
        }

        if trimmed.chars().count() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string()
            ));
        }

        Ok(trimmed.to_string())
    }

    /// Unknown zones are rejected at the boundary rather than silently
    /// bucketed as UTC
    fn validate_timezone(timezone: Option<String>) -> Result<Option<String>, DomainError> {
        match timezone {
            Some(name) if name.trim().is_empty() => Ok(None),
            Some(name) => {
                parse_timezone(&name)?;
                Ok(Some(name.trim().to_string()))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 23, 30, 0).unwrap()
    }

    #[test]
    fn test_create_valid_habit() {
        let habit = Habit::new(
            "  Drink water ".to_string(),
            Frequency::Daily,
            HabitKind::quantifiable(8.0, Some("glasses".to_string())).unwrap(),
            Some("Europe/Paris".to_string()),
            created(),
        )
        .unwrap();

        assert_eq!(habit.name, "Drink water");
        assert!(habit.is_quantifiable());
        assert_eq!(habit.target_display(), Some("8 glasses".to_string()));
        assert_eq!(habit.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn test_invalid_habit_name() {
        let result = Habit::new("".to_string(), Frequency::Daily, HabitKind::Boolean, None, created());
        assert!(matches!(result, Err(DomainError::InvalidHabitName(_))));
    }

    #[test]
    fn test_unknown_timezone_rejected_on_create() {
        let result = Habit::new(
            "Read".to_string(),
            Frequency::Daily,
            HabitKind::Boolean,
            Some("Atlantis/Central".to_string()),
            created(),
        );
        assert!(matches!(result, Err(DomainError::InvalidTimezone(_))));
    }

    #[test]
    fn test_created_on_uses_habit_zone() {
        let habit = Habit::new(
            "Read".to_string(),
            Frequency::Daily,
            HabitKind::Boolean,
            Some("Asia/Tokyo".to_string()),
            created(),
        )
        .unwrap();

        // 23:30 UTC on Mar 1 is Mar 2 in Tokyo
        assert_eq!(habit.created_on(chrono_tz::UTC), "2024-03-02".parse().unwrap());

        let default_zone = Habit::new("Walk".to_string(), Frequency::Daily, HabitKind::Boolean, None, created()).unwrap();
        assert_eq!(default_zone.created_on(chrono_tz::UTC), "2024-03-01".parse().unwrap());
        assert_eq!(default_zone.created_on(chrono_tz::Asia::Tokyo), "2024-03-02".parse().unwrap());
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut habit = Habit::new(
            "Water".to_string(),
            Frequency::Daily,
            HabitKind::quantifiable(8.0, None).unwrap(),
            None,
            created(),
        )
        .unwrap();

        // Valid name but invalid target: nothing applied
        let result = habit.update(Some("Hydrate".to_string()), None, None, Some(-1.0), None);
        assert!(result.is_err());
        assert_eq!(habit.name, "Water");

        habit
            .update(Some("Hydrate".to_string()), Some(Frequency::Weekly), None, Some(10.0), Some(Some("cups".to_string())))
            .unwrap();
        assert_eq!(habit.name, "Hydrate");
        assert_eq!(habit.frequency, Frequency::Weekly);
        assert_eq!(habit.kind.target_quantity(), Some(10.0));
        assert_eq!(habit.kind.unit(), Some("cups"));
    }

    #[test]
    fn test_boolean_habit_rejects_target_update() {
        let mut habit = Habit::new("Meditate".to_string(), Frequency::Daily, HabitKind::Boolean, None, created()).unwrap();
        assert!(habit.update(None, None, None, Some(3.0), None).is_err());
        assert_eq!(habit.kind, HabitKind::Boolean);
    }
}
