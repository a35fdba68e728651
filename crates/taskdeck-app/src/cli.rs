//! Command-line flags for the Taskdeck server binary.
//!
//! Everything here is an override: a flag beats the matching environment
//! variable, which beats the config file, which beats the compiled default.

use clap::Parser;
use std::path::PathBuf;

/// Taskdeck — a multi-tenant task-management backend with a conversational
/// task assistant.
#[derive(Parser, Debug)]
#[command(name = "taskdeck", version, about)]
pub struct CliArgs {
    /// Configuration file to load.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Port the API server listens on.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// SQLite database file.
    #[arg(short = 'd', long = "database")]
    pub database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Where to look for the config file: `--config`, then the
    /// `TASKDECK_CONFIG` environment variable, then `./taskdeck.toml`.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("TASKDECK_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("taskdeck.toml")
    }

    /// The port to bind: `--port`, then `TASKDECK_PORT`, then the value
    /// already in the config.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Ok(val) = std::env::var("TASKDECK_PORT") {
            if let Ok(p) = val.parse::<u16>() {
                return p;
            }
        }
        config_port
    }

    /// Database path override from `--database`, if given.
    pub fn resolve_database(&self) -> Option<String> {
        self.database
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Log level override from `--log-level`, if given.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}
