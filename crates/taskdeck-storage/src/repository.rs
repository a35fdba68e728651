//! Repositories for users, conversations, and messages.
//!
//! Each repository holds an `Arc<Database>` and issues raw SQL through
//! `with_conn`. Conversation and message lookups are always filtered by the
//! owning user where ownership applies; a conversation owned by another
//! user resolves exactly like one that does not exist.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use taskdeck_core::error::TaskdeckError;
use taskdeck_core::types::{Conversation, Message, MessageRole, User};

use crate::db::Database;

/// Repository for registered users.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new user row. The caller is expected to have checked for an
    /// existing email first; a surviving UNIQUE violation still surfaces as
    /// a storage error.
    pub fn create(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<User, TaskdeckError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, hashed_password, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_string(), email, hashed_password, now],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to create user: {}", e)))?;

            tracing::info!(user_id = %id, email, "User created");

            Ok(User {
                id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
                created_at: epoch_to_datetime(now),
            })
        })
    }

    /// Find a user by email (exact match; callers normalize case).
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, hashed_password, created_at FROM users WHERE email = ?1",
                    rusqlite::params![email],
                    |row| Ok(row_to_user(row)),
                )
                .optional()
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            match row {
                Some(user) => Ok(Some(user?)),
                None => Ok(None),
            }
        })
    }

    /// Find a user by id.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<User>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, email, hashed_password, created_at FROM users WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| Ok(row_to_user(row)),
                )
                .optional()
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            match row {
                Some(user) => Ok(Some(user?)),
                None => Ok(None),
            }
        })
    }
}

/// Repository for conversation sessions.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new conversation owned by the given user.
    pub fn create(&self, user_id: Uuid) -> Result<Conversation, TaskdeckError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?2)",
                rusqlite::params![user_id.to_string(), now],
            )
            .map_err(|e| {
                TaskdeckError::Storage(format!("Failed to create conversation: {}", e))
            })?;

            let id = conn.last_insert_rowid();
            tracing::info!(conversation_id = id, user_id = %user_id, "Conversation created");

            Ok(Conversation {
                id,
                user_id,
                created_at: epoch_to_datetime(now),
                updated_at: epoch_to_datetime(now),
            })
        })
    }

    /// Fetch a conversation by id, verifying it belongs to the user.
    ///
    /// Returns `None` both for a nonexistent id and for an id owned by a
    /// different user; the caller cannot tell the two apart.
    pub fn find_for_user(
        &self,
        conversation_id: i64,
        user_id: Uuid,
    ) -> Result<Option<Conversation>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, user_id, created_at, updated_at
                     FROM conversations
                     WHERE id = ?1 AND user_id = ?2",
                    rusqlite::params![conversation_id, user_id.to_string()],
                    |row| Ok(row_to_conversation(row)),
                )
                .optional()
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            match row {
                Some(conv) => Ok(Some(conv?)),
                None => Ok(None),
            }
        })
    }

    /// Update the conversation's updated_at timestamp to now.
    ///
    /// A no-op when the conversation does not exist.
    pub fn touch(&self, conversation_id: i64) -> Result<(), TaskdeckError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, conversation_id],
            )
            .map_err(|e| {
                TaskdeckError::Storage(format!("Failed to touch conversation: {}", e))
            })?;
            Ok(())
        })
    }
}

/// Repository for conversation messages.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert one message row.
    ///
    /// An invalid conversation id violates the foreign key and surfaces as
    /// a storage error; it is never swallowed here.
    pub fn create(
        &self,
        conversation_id: i64,
        user_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, TaskdeckError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (conversation_id, user_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    conversation_id,
                    user_id.to_string(),
                    role.as_str(),
                    content,
                    now
                ],
            )
            .map_err(|e| TaskdeckError::Storage(format!("Failed to create message: {}", e)))?;

            let id = conn.last_insert_rowid();

            Ok(Message {
                id,
                conversation_id,
                user_id,
                role,
                content: content.to_string(),
                created_at: epoch_to_datetime(now),
            })
        })
    }

    /// All messages for a conversation, ordered by creation time ascending
    /// with insertion order breaking ties.
    pub fn list_for_conversation(
        &self,
        conversation_id: i64,
    ) -> Result<Vec<Message>, TaskdeckError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, user_id, role, content, created_at
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, id ASC",
                )
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| TaskdeckError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| TaskdeckError::Storage(e.to_string()))??;
                messages.push(message);
            }
            Ok(messages)
        })
    }
}

// ============================================================================
// Row mappers
// ============================================================================

pub(crate) fn epoch_to_datetime(epoch: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_default()
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, TaskdeckError> {
    Uuid::parse_str(s).map_err(|e| TaskdeckError::Storage(format!("Invalid UUID: {}", e)))
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, TaskdeckError> {
    let id_str: String = row.get(0).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let email: String = row.get(1).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let hashed_password: String = row
        .get(2)
        .map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(3).map_err(|e| TaskdeckError::Storage(e.to_string()))?;

    Ok(User {
        id: parse_uuid(&id_str)?,
        email,
        hashed_password,
        created_at: epoch_to_datetime(created_at),
    })
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, TaskdeckError> {
    let id: i64 = row.get(0).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let user_id_str: String = row.get(1).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(2).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let updated_at: i64 = row.get(3).map_err(|e| TaskdeckError::Storage(e.to_string()))?;

    Ok(Conversation {
        id,
        user_id: parse_uuid(&user_id_str)?,
        created_at: epoch_to_datetime(created_at),
        updated_at: epoch_to_datetime(updated_at),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, TaskdeckError> {
    let id: i64 = row.get(0).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let conversation_id: i64 = row.get(1).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let user_id_str: String = row.get(2).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let role_str: String = row.get(3).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let content: String = row.get(4).map_err(|e| TaskdeckError::Storage(e.to_string()))?;
    let created_at: i64 = row.get(5).map_err(|e| TaskdeckError::Storage(e.to_string()))?;

    let role = MessageRole::parse(&role_str)
        .ok_or_else(|| TaskdeckError::Storage(format!("Invalid message role: {}", role_str)))?;

    Ok(Message {
        id,
        conversation_id,
        user_id: parse_uuid(&user_id_str)?,
        role,
        content,
        created_at: epoch_to_datetime(created_at),
    })
}
