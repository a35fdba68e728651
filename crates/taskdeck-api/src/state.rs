//! Shared state handed to every route handler.

use std::sync::Arc;
use std::time::Instant;

use taskdeck_core::config::AppConfig;
use taskdeck_storage::Database;

/// Everything a handler needs, cloned cheaply per request.
///
/// The configuration is frozen at startup — handlers read it through the
/// Arc and nothing consults ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Arc<Database>,
    /// When the server came up, for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, database: Database) -> Self {
        Self {
            config: Arc::new(config),
            database: Arc::new(database),
            start_time: Instant::now(),
        }
    }
}
