//! Versioned schema migrations.
//!
//! The schema lives in numbered steps tracked in `schema_migrations`;
//! opening a database applies whatever is still missing. Version 1 holds
//! the whole current schema: users, categories, tasks, conversations,
//! messages.

use rusqlite::Connection;
use tracing::info;

use taskdeck_core::error::TaskdeckError;

/// Bring the schema up to the latest version.
pub fn run_migrations(conn: &Connection) -> Result<(), TaskdeckError> {
    if schema_version(conn)? < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }
    Ok(())
}

/// The highest applied migration version, creating the tracking table on
/// first contact.
fn schema_version(conn: &Connection) -> Result<i64, TaskdeckError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| TaskdeckError::Storage(format!("Failed to create migrations table: {}", e)))?;

    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| TaskdeckError::Storage(format!("Failed to query migration version: {}", e)))
}

/// Version 1: the initial schema.
fn apply_v1(conn: &Connection) -> Result<(), TaskdeckError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY NOT NULL,
            email           TEXT NOT NULL UNIQUE,
            hashed_password TEXT NOT NULL,
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_email
            ON users (email);

        CREATE TABLE IF NOT EXISTS categories (
            id          TEXT PRIMARY KEY NOT NULL,
            user_id     TEXT NOT NULL,
            name        TEXT NOT NULL,
            description TEXT,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_categories_user
            ON categories (user_id, name ASC);

        CREATE TABLE IF NOT EXISTS tasks (
            id           TEXT PRIMARY KEY NOT NULL,
            user_id      TEXT NOT NULL,
            category_id  TEXT,
            title        TEXT NOT NULL,
            description  TEXT,
            status       TEXT NOT NULL DEFAULT 'pending'
                         CHECK (status IN ('pending', 'in_progress', 'completed', 'archived')),
            priority     TEXT NOT NULL DEFAULT 'medium'
                         CHECK (priority IN ('low', 'medium', 'high')),
            due_date     TEXT,
            completed_at INTEGER,
            created_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at   INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_user_created
            ON tasks (user_id, created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_tasks_user_status
            ON tasks (user_id, status);

        CREATE INDEX IF NOT EXISTS idx_tasks_category
            ON tasks (category_id)
            WHERE category_id IS NOT NULL;

        CREATE TABLE IF NOT EXISTS conversations (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id     TEXT NOT NULL,
            created_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user_updated
            ON conversations (user_id, updated_at DESC);

        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL,
            user_id         TEXT NOT NULL,
            role            TEXT NOT NULL
                            CHECK (role IN ('user', 'assistant')),
            content         TEXT NOT NULL,
            created_at      INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
            FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation_created
            ON messages (conversation_id, created_at ASC, id ASC);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| TaskdeckError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
