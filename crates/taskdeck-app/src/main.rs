//! Taskdeck server binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Parse CLI arguments
//! 2. Load configuration from TOML (explicit object, no global state)
//! 3. Open the SQLite database and run migrations
//! 4. Start the axum REST API server

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use taskdeck_api::{routes, AppState};
use taskdeck_core::config::AppConfig;
use taskdeck_storage::Database;

mod cli;

use cli::CliArgs;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // Load config first so CLI overrides can be applied on top of it.
    let config_path = args.resolve_config_path();
    let mut config = AppConfig::load_or_default(&config_path);
    config.server.port = args.resolve_port(config.server.port);
    if let Some(db_path) = args.resolve_database() {
        config.database.path = db_path;
    }
    if let Some(level) = args.resolve_log_level() {
        config.logging.level = level;
    }

    // RUST_LOG wins over the configured level when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "Taskdeck starting"
    );

    let database = match Database::new(Path::new(&config.database.path)) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            std::process::exit(1);
        }
    };

    let state = AppState::new(config, database);

    if let Err(e) = routes::start_server(state).await {
        tracing::error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}
