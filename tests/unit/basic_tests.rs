/// Basic unit tests to verify core functionality
use habit_progress_engine::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_unit_tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_habit_creation() {
        let habit = Habit::new(
            "Test Habit".to_string(),
            Frequency::Daily,
            HabitKind::Boolean,
            None,
            Utc::now(),
        );

        assert!(habit.is_ok());
        let habit = habit.unwrap();
        assert_eq!(habit.name, "Test Habit");
        assert!(!habit.is_quantifiable());
    }

    #[test]
    fn test_quantifiable_habit_creation() {
        let kind = HabitKind::quantifiable(8.0, Some("glasses".to_string())).unwrap();
        let habit = Habit::new("Water".to_string(), Frequency::Daily, kind, Some("Asia/Tokyo".to_string()), Utc::now()).unwrap();

        assert_eq!(habit.target_display().as_deref(), Some("8 glasses"));
        assert_eq!(habit.zone(chrono_tz::UTC).tz, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_frequency_parsing() {
        assert_eq!("Weekly".parse::<Frequency>().unwrap(), Frequency::Weekly);
        assert!("fortnightly".parse::<Frequency>().is_err());
    }

    #[tokio::test]
    async fn test_server_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(temp_file.path().to_path_buf(), EngineConfig::default()).await;
        assert!(server.is_ok());
    }

    #[test]
    fn test_storage_creation() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf());
        assert!(storage.is_ok());
    }

    #[test]
    fn test_server_creation_blocking() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = tokio_test::block_on(HabitTrackerServer::new(
            temp_file.path().to_path_buf(),
            EngineConfig::default().with_rate_window(7).unwrap(),
        ))
        .expect("Failed to create server");

        assert_eq!(server.config().completion_rate_window_days, 7);
        assert!(server.cache().is_enabled());
    }
}
