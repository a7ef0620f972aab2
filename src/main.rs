//! CLI entry point for the health data hub.
//!
//! Provides subcommands for exporting participant health data, serving the
//! authenticated API, and seeding the account store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use health_hub::auth::hash_password;
use health_hub::config::{PipelineConfig, ServerConfig};
use health_hub::discover::list_participants;
use health_hub::export::run_export;
use health_hub::server;
use health_hub::store::{StoreError, UserStore};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "health_hub")]
#[command(about = "Normalize participant health exports and serve them over an authenticated API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every participant directory and write per-participant JSON artifacts
    Export {
        /// Directory containing one subdirectory per participant
        /// (overrides INPUT_DIR)
        #[arg(short, long)]
        input_dir: Option<PathBuf>,

        /// Directory to write processed artifacts into (overrides PROCESSED_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Maximum number of participants processed concurrently
        /// (overrides EXPORT_CONCURRENCY)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Serve the authenticated HTTP API over processed artifacts
    Serve,
    /// Ensure the admin account exists and create one account per participant
    SeedUsers {
        /// Directory containing one subdirectory per participant
        #[arg(short, long, default_value = "input")]
        input_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/health_hub.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("health_hub.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input_dir,
            output_dir,
            concurrency,
        } => {
            let config =
                export_config(PipelineConfig::from_env()?, input_dir, output_dir, concurrency);
            run_export(&config).await?;
        }
        Commands::Serve => {
            let config = ServerConfig::from_env()?;
            server::serve(config).await?;
        }
        Commands::SeedUsers { input_dir } => {
            let config = ServerConfig::from_env()?;
            seed_users(&config, &input_dir).await?;
        }
    }

    Ok(())
}

/// Applies CLI overrides on top of the env-derived pipeline config. Flags
/// that were not given leave the env values (or their defaults) in place.
fn export_config(
    mut config: PipelineConfig,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    concurrency: Option<usize>,
) -> PipelineConfig {
    if let Some(dir) = input_dir {
        config.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        config.processed_dir = dir;
    }
    if let Some(n) = concurrency {
        config.concurrency = n;
    }
    config
}

/// Creates the designated admin account and one account per participant
/// directory (username = participant id), skipping accounts that exist.
async fn seed_users(config: &ServerConfig, input_dir: &Path) -> Result<()> {
    let store = UserStore::connect(&config.database_path).await?;

    let admin_password =
        std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "ChangeMeNow!".to_string());
    seed_one(&store, &config.admin_username, &admin_password, "admin").await;

    let default_password =
        std::env::var("DEFAULT_USER_PASSWORD").unwrap_or_else(|_| "password123".to_string());
    let participants = list_participants(input_dir)?;
    info!(participant_count = participants.len(), "Seeding participant accounts");
    for participant_id in &participants {
        seed_one(&store, participant_id, &default_password, participant_id).await;
    }

    info!("Seeding complete");
    Ok(())
}

async fn seed_one(store: &UserStore, username: &str, password: &str, participant_id: &str) {
    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            error!(username, error = %e, "Password hashing failed, skipping user");
            return;
        }
    };
    match store.create_user(username, &hash, participant_id).await {
        Ok(()) => info!(username, participant_id, "User created"),
        Err(StoreError::DuplicateUsername(_)) => info!(username, "User exists, skipping"),
        Err(e) => error!(username, error = %e, "Failed to create user"),
    }
}
