/// SQLite implementation of the habit store
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving habit data. It handles all SQL queries and data conversion.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

use crate::domain::{CompletionEvent, DayKey, Frequency, Habit, HabitId, HabitKind};
use crate::storage::{migrations, HabitStore, StorageError};

const HABIT_COLUMNS: &str = "id, name, frequency, kind, target_quantity, unit, timezone, created_at";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// all the operations defined in the HabitStore trait.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) a database file and bring its schema up to date
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// A private in-memory database, mostly for tests
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        // Cascading deletes rely on foreign keys being enforced
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Build a Habit from a row selected with HABIT_COLUMNS
    fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
        let id_str: String = row.get(0)?;
        let id = HabitId::from_string(&id_str).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "Invalid UUID".to_string(), Type::Text)
        })?;

        let frequency_str: String = row.get(2)?;
        let frequency: Frequency = frequency_str.parse().map_err(|_| {
            rusqlite::Error::InvalidColumnType(2, "Invalid frequency".to_string(), Type::Text)
        })?;

        let kind_str: String = row.get(3)?;
        let kind = match kind_str.as_str() {
            "boolean" => HabitKind::Boolean,
            "quantifiable" => HabitKind::Quantifiable {
                target_quantity: row.get(4)?,
                unit: row.get(5)?,
            },
            _ => {
                return Err(rusqlite::Error::InvalidColumnType(3, "Invalid habit kind".to_string(), Type::Text));
            }
        };

        let created_at_str: String = row.get(7)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(7, "Invalid datetime".to_string(), Type::Text)
            })?
            .with_timezone(&Utc);

        Ok(Habit::from_existing(
            id,
            row.get(1)?, // name
            frequency,
            kind,
            row.get(6)?, // timezone
            created_at,
        ))
    }

    fn completion_from_row(habit_id: &HabitId, row: &Row<'_>) -> rusqlite::Result<CompletionEvent> {
        let day_str: String = row.get(0)?;
        let day = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d")
            .map_err(|_| rusqlite::Error::InvalidColumnType(0, "Invalid date".to_string(), Type::Text))?;

        let recorded_at_str: String = row.get(1)?;
        let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
            .map_err(|_| {
                rusqlite::Error::InvalidColumnType(1, "Invalid datetime".to_string(), Type::Text)
            })?
            .with_timezone(&Utc);

        Ok(CompletionEvent::new(habit_id.clone(), DayKey::new(day), recorded_at))
    }

    /// A write that references a missing habit trips the foreign key
    fn write_error(habit_id: &HabitId, error: rusqlite::Error) -> StorageError {
        match &error {
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StorageError::HabitNotFound { habit_id: habit_id.to_string() }
            }
            _ => StorageError::from(error),
        }
    }

    fn kind_columns(kind: &HabitKind) -> (&'static str, Option<f64>, Option<&str>) {
        match kind {
            HabitKind::Boolean => ("boolean", None, None),
            HabitKind::Quantifiable { target_quantity, unit } => {
                ("quantifiable", Some(*target_quantity), unit.as_deref())
            }
        }
    }
}

impl HabitStore for SqliteStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let (kind, target_quantity, unit) = Self::kind_columns(&habit.kind);

        self.conn.execute(
            "INSERT INTO habits (
                id, name, frequency, kind, target_quantity, unit, timezone, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                habit.id.to_string(),
                habit.name,
                habit.frequency.as_str(),
                kind,
                target_quantity,
                unit,
                habit.timezone,
                habit.created_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        let sql = format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS);

        self.conn
            .query_row(&sql, params![habit_id.to_string()], Self::habit_from_row)
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let (kind, target_quantity, unit) = Self::kind_columns(&habit.kind);

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                name = ?2,
                frequency = ?3,
                kind = ?4,
                target_quantity = ?5,
                unit = ?6,
                timezone = ?7
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.frequency.as_str(),
                kind,
                target_quantity,
                unit,
                habit.timezone,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM habits WHERE id = ?1",
            params![habit_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }

        tracing::debug!("Deleted habit and its history: {}", habit_id);
        Ok(())
    }

    fn list_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let sql = format!("SELECT {} FROM habits ORDER BY created_at DESC", HABIT_COLUMNS);

        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map([], Self::habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(habits)
    }

    fn list_completions(&self, habit_id: &HabitId) -> Result<Vec<CompletionEvent>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT day, recorded_at FROM habit_completions
             WHERE habit_id = ?1
             ORDER BY day DESC",
        )?;

        let events = stmt
            .query_map(params![habit_id.to_string()], |row| Self::completion_from_row(habit_id, row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn has_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM habit_completions WHERE habit_id = ?1 AND day = ?2",
                params![habit_id.to_string(), day.to_string()],
                |_| Ok(()),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn upsert_completion(&self, event: &CompletionEvent) -> Result<bool, StorageError> {
        let inserted = self.conn.execute(
            "INSERT INTO habit_completions (habit_id, day, recorded_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (habit_id, day) DO NOTHING",
            params![
                event.habit_id.to_string(),
                event.day.to_string(),
                event.recorded_at.to_rfc3339(),
            ],
        )
        .map_err(|e| Self::write_error(&event.habit_id, e))?;

        if inserted > 0 {
            tracing::debug!("Recorded completion for habit {} on {}", event.habit_id, event.day);
        }
        Ok(inserted > 0)
    }

    fn delete_completion(&self, habit_id: &HabitId, day: DayKey) -> Result<bool, StorageError> {
        let removed = self.conn.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1 AND day = ?2",
            params![habit_id.to_string(), day.to_string()],
        )?;

        if removed > 0 {
            tracing::debug!("Removed completion for habit {} on {}", habit_id, day);
        }
        Ok(removed > 0)
    }

    fn get_quantity(&self, habit_id: &HabitId, day: DayKey) -> Result<f64, StorageError> {
        let quantity = self
            .conn
            .query_row(
                "SELECT quantity FROM habit_quantities WHERE habit_id = ?1 AND day = ?2",
                params![habit_id.to_string(), day.to_string()],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;

        Ok(quantity.unwrap_or(0.0))
    }

    fn list_quantities(&self, habit_id: &HabitId) -> Result<Vec<(DayKey, f64)>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT day, quantity FROM habit_quantities
             WHERE habit_id = ?1
             ORDER BY day ASC",
        )?;

        let days = stmt
            .query_map(params![habit_id.to_string()], |row| {
                let day_str: String = row.get(0)?;
                let day = NaiveDate::parse_from_str(&day_str, "%Y-%m-%d").map_err(|_| {
                    rusqlite::Error::InvalidColumnType(0, "Invalid date".to_string(), Type::Text)
                })?;
                Ok((DayKey::new(day), row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(days)
    }

    fn set_quantity(&self, habit_id: &HabitId, day: DayKey, value: f64) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO habit_quantities (habit_id, day, quantity)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (habit_id, day) DO UPDATE SET quantity = excluded.quantity",
            params![habit_id.to_string(), day.to_string(), value],
        )
        .map_err(|e| Self::write_error(habit_id, e))?;

        tracing::debug!("Set quantity for habit {} on {} to {}", habit_id, day, value);
        Ok(())
    }

    fn increment_quantity(&self, habit_id: &HabitId, day: DayKey, delta: f64) -> Result<f64, StorageError> {
        // Single statement: SQLite applies the read-modify-write atomically
        let quantity = self.conn.query_row(
            "INSERT INTO habit_quantities (habit_id, day, quantity)
             VALUES (?1, ?2, MAX(0.0, ?3))
             ON CONFLICT (habit_id, day)
             DO UPDATE SET quantity = MAX(0.0, habit_quantities.quantity + ?3)
             RETURNING quantity",
            params![habit_id.to_string(), day.to_string(), delta],
            |row| row.get::<_, f64>(0),
        )
        .map_err(|e| Self::write_error(habit_id, e))?;

        tracing::debug!("Adjusted quantity for habit {} on {} by {} to {}", habit_id, day, delta, quantity);
        Ok(quantity)
    }

    fn with_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StorageError>,
    {
        // Immediate: take the write lock up front so a competing writer
        // fails fast instead of deadlocking on upgrade
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;

        // Dropping `tx` on the error path rolls back
        let value = f(self)?;
        tx.commit().map_err(StorageError::from)?;
        Ok(value)
    }
}
