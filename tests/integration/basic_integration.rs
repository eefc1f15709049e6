/// Basic integration tests
use habit_progress_engine::*;
use tempfile::NamedTempFile;

#[cfg(test)]
mod basic_integration_tests {
    use super::*;
    use habit_progress_engine::tools::{self, CompleteHabitParams, CreateHabitParams, IncrementParams};

    fn create_params(name: &str, target: Option<f64>) -> CreateHabitParams {
        CreateHabitParams {
            name: name.to_string(),
            frequency: None,
            target_quantity: target,
            unit: None,
            timezone: None,
        }
    }

    #[tokio::test]
    async fn test_server_basic_workflow() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let server = HabitTrackerServer::new(temp_file.path().to_path_buf(), EngineConfig::default())
            .await
            .expect("Failed to create server");
        let ctx = server.tool_context();

        let created = tools::create_habit(&ctx, create_params("Read", None)).unwrap();
        let completed = tools::complete_habit(
            &ctx,
            CompleteHabitParams { habit_id: created.habit_id.clone(), day: None },
        )
        .unwrap();

        assert!(completed.snapshot.completed_today);
        assert_eq!(completed.snapshot.current_streak, 1);
        assert_eq!(completed.snapshot.completion_rate, 100.0);
    }

    #[tokio::test]
    async fn test_database_persistence() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let habit_id = {
            let server = HabitTrackerServer::new(db_path.clone(), EngineConfig::default())
                .await
                .expect("Failed to create first server");
            let ctx = server.tool_context();
            let created = tools::create_habit(&ctx, create_params("Water", Some(8.0))).unwrap();
            tools::increment_quantity(
                &ctx,
                IncrementParams { habit_id: created.habit_id.clone(), amount: 8.0, day: None },
            )
            .unwrap();
            created.habit_id
        };

        let server = HabitTrackerServer::new(db_path, EngineConfig::default())
            .await
            .expect("Failed to create second server");
        let id = HabitId::from_string(&habit_id).unwrap();
        let snapshot = server.evaluator().snapshot(&id, None).unwrap();

        assert_eq!(snapshot.current_quantity, Some(8.0));
        assert!(snapshot.completed_today);
        assert_eq!(server.storage().list_habits().unwrap().len(), 1);
    }

    #[test]
    fn test_storage_interface() {
        fn assert_store<S: HabitStore>(_: &S) {}

        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let storage = SqliteStorage::new(temp_file.path().to_path_buf()).expect("Failed to create storage");
        assert_store(&storage);
        assert_store(&MemoryStorage::new());
    }
}
