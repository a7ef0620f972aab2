//! Explicit configuration passed into the pipeline and API at construction
//! time. Environment variables are read here and nowhere else.

use std::env;
use std::path::PathBuf;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Batch export pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory holding one subdirectory per participant.
    pub input_dir: PathBuf,
    /// Directory the per-participant JSON artifacts are written into.
    pub processed_dir: PathBuf,
    /// Trailing window sizes for moving averages.
    pub rolling_windows: Vec<usize>,
    /// Maximum participants processed concurrently.
    pub concurrency: usize,
}

impl PipelineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, processed_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            processed_dir: processed_dir.into(),
            rolling_windows: vec![7, 30],
            concurrency: 4,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let rolling_windows = match env::var("ROLLING_WINDOWS") {
            Ok(raw) => raw
                .split(',')
                .map(|w| w.trim().parse::<usize>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| {
                    ConfigError::InvalidValue(
                        "ROLLING_WINDOWS must be comma-separated integers".to_string(),
                    )
                })?,
            Err(_) => vec![7, 30],
        };

        Ok(Self {
            input_dir: env::var("INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("input")),
            processed_dir: env::var("PROCESSED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("processed_data")),
            rolling_windows,
            concurrency: env::var("EXPORT_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
        })
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (0.0.0.0 for LAN, 127.0.0.1 for localhost).
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// SQLite database file for the account store.
    pub database_path: PathBuf,
    /// Directory holding the exported participant artifacts.
    pub processed_dir: PathBuf,
    /// The designated admin account; it cannot be deleted or reset via API.
    pub admin_username: String,
    /// Session timeout in seconds.
    pub session_timeout_seconds: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5001".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("app.db")),
            processed_dir: env::var("PROCESSED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("processed_data")),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            session_timeout_seconds: env::var("SESSION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
        })
    }

    /// Get the full bind address (addr:port).
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
