//! SQLite connection handling.
//!
//! A single connection guarded by a Mutex. Foreign-key enforcement is
//! switched on before any query runs and migrations are applied as part of
//! opening, so a handle that exists is a handle with the full schema.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use taskdeck_core::error::TaskdeckError;

use crate::migrations;

/// Shared handle to the SQLite store.
///
/// rusqlite's `Connection` is not `Sync`, so it lives behind a Mutex; one
/// request's storage work holds the lock until it finishes, which is also
/// what gives each request an exclusive session.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database file, creating it (and its parent directory) when
    /// missing, then bring the schema up to date.
    pub fn new(path: &Path) -> Result<Self, TaskdeckError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| TaskdeckError::Storage(format!("Failed to open database: {}", e)))?;

        let db = Self::from_connection(conn, true)?;
        info!("Database ready at {}", path.display());
        Ok(db)
    }

    /// An in-memory database with the full schema, for tests.
    pub fn in_memory() -> Result<Self, TaskdeckError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TaskdeckError::Storage(format!("Failed to open in-memory db: {}", e))
        })?;
        Self::from_connection(conn, false)
    }

    fn from_connection(conn: Connection, durable: bool) -> Result<Self, TaskdeckError> {
        // WAL journaling and synchronous tuning only apply to file-backed
        // stores; an in-memory database just needs foreign keys.
        let pragmas = if durable {
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = ON;"
        };
        conn.execute_batch(pragmas)
            .map_err(|e| TaskdeckError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run a closure against the connection while holding the lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, TaskdeckError>
    where
        F: FnOnce(&Connection) -> Result<T, TaskdeckError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| TaskdeckError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}
