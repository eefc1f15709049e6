/// Public library interface for the Habit Progress Engine
///
/// The engine derives streaks, completion rates and progress snapshots from
/// a per-habit completion ledger and daily quantities. This crate also ships
/// an MCP server exposing it as tools over stdin/stdout.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod mcp;
pub mod storage;
pub mod tools;

pub use cache::SnapshotCache;
pub use config::EngineConfig;
pub use domain::*;
pub use engine::{CompletionLedger, EngineError, ProgressEvaluator, QuantityAccumulator};
pub use storage::{HabitStore, MemoryStorage, SqliteStorage, StorageError};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("Configuration error: {0}")]
    Domain(#[from] domain::DomainError),

    #[error("Engine error: {0}")]
    Engine(#[from] engine::EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Habit progress server backed by SQLite
pub struct HabitTrackerServer {
    storage: SqliteStorage,
    config: EngineConfig,
    clock: SystemClock,
    cache: SnapshotCache,
}

impl HabitTrackerServer {
    /// Open (or create) the database at `db_path`
    pub async fn new(db_path: PathBuf, config: EngineConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing Habit Progress Engine with database: {:?}", db_path);
        let storage = SqliteStorage::new(db_path)?;
        Ok(Self::with_storage(storage, config))
    }

    pub fn with_storage(storage: SqliteStorage, config: EngineConfig) -> Self {
        let cache = SnapshotCache::new(config.snapshot_cache_ttl);
        Self {
            storage,
            config,
            clock: SystemClock,
            cache,
        }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// This method will block until stdin is closed or an error occurs.
    pub async fn run(self) -> Result<(), ServerError> {
        let habits = self.storage.list_habits()?;
        tracing::info!(
            "Server started with {} existing habits, default timezone {}",
            habits.len(),
            self.config.default_timezone
        );

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await?;

        Ok(())
    }

    pub fn tool_context(&self) -> tools::ToolContext<'_, SqliteStorage, SystemClock> {
        tools::ToolContext {
            storage: &self.storage,
            clock: &self.clock,
            config: &self.config,
            cache: &self.cache,
        }
    }

    pub fn evaluator(&self) -> ProgressEvaluator<'_, SqliteStorage, SystemClock> {
        ProgressEvaluator::new(&self.storage, &self.clock, &self.config)
    }

    /// Get a reference to the storage layer (useful for testing)
    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }
}
