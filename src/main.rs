/// Main entry point for the Habit Progress Engine MCP server
///
/// This file sets up logging, parses command line arguments, and starts the MCP server.
/// The server listens for JSON-RPC requests over stdin/stdout following the MCP protocol.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use habit_progress_engine::{EngineConfig, HabitTrackerServer};

/// Get the default database path, falling back through user directories
fn get_default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let potential_paths = [
        dirs::home_dir().map(|p| p.join(".habit_progress")),
        dirs::data_dir().map(|p| p.join("habit_progress")),
        dirs::config_dir().map(|p| p.join("habit_progress")),
        std::env::current_dir().ok().map(|p| p.join(".habit_progress")),
    ];

    for potential_path in potential_paths.iter().flatten() {
        if std::fs::create_dir_all(potential_path).is_ok() {
            let test_file = potential_path.join(".test_write");
            if std::fs::write(&test_file, "test").is_ok() {
                let _ = std::fs::remove_file(&test_file);
                return Ok(potential_path.join("habits.db"));
            }
        }
    }

    let temp_path = std::env::temp_dir().join("habit_progress");
    std::fs::create_dir_all(&temp_path)?;

    tracing::warn!("Using temporary directory for database: {}", temp_path.display());
    Ok(temp_path.join("habits.db"))
}

/// Command line arguments for the Habit Progress Engine MCP server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    /// If not provided, uses a default location in the user's home directory
    #[arg(long)]
    database: Option<PathBuf>,

    /// IANA timezone for habits that don't set their own
    #[arg(long, default_value = "UTC")]
    default_timezone: String,

    /// Trailing window for completion rates, in days
    #[arg(long, default_value_t = 30)]
    rate_window_days: u32,

    /// How long habit_status may serve a cached snapshot; 0 disables the cache
    #[arg(long, default_value_t = 30)]
    cache_ttl_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habit_progress_engine={}", log_level))
        .with_writer(std::io::stderr) // stdout carries JSON-RPC
        .init();

    info!("Starting Habit Progress Engine MCP server");

    let config = EngineConfig::default()
        .with_default_timezone(&args.default_timezone)?
        .with_rate_window(args.rate_window_days)?
        .with_cache_ttl(Duration::from_secs(args.cache_ttl_secs));

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => get_default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let server = HabitTrackerServer::new(db_path, config).await?;
    server.run().await?;

    info!("Habit Progress Engine MCP server shutdown complete");
    Ok(())
}
