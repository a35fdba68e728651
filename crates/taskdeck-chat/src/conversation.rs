//! Conversation store: session resolution and message persistence.
//!
//! Wraps the conversation and message repositories behind the operations
//! the chat pipeline needs: resolve-or-create a session, append turns, and
//! project stored history into the role/content view the classifier takes.

use std::sync::Arc;

use uuid::Uuid;

use taskdeck_core::types::{Conversation, Message, MessageRole};
use taskdeck_storage::{ConversationRepository, Database, MessageRepository};

use crate::error::ChatError;
use crate::types::HistoryEntry;

/// Persistence facade for chat sessions, scoped by owning user.
pub struct ConversationStore {
    conversations: ConversationRepository,
    messages: MessageRepository,
}

impl ConversationStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            conversations: ConversationRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(db),
        }
    }

    /// Load an existing conversation or create a new one.
    ///
    /// With an id: fetch filtered by id AND owner, returning `None` when no
    /// row matches — a nonexistent id and an id owned by someone else are
    /// indistinguishable here. On a hit, the full message history is
    /// returned in creation order. Without an id: create a fresh
    /// conversation for the user with an empty history.
    pub fn resolve(
        &self,
        user_id: Uuid,
        conversation_id: Option<i64>,
    ) -> Result<Option<(Conversation, Vec<Message>)>, ChatError> {
        match conversation_id {
            Some(id) => {
                let Some(conversation) = self.conversations.find_for_user(id, user_id)? else {
                    return Ok(None);
                };
                let messages = self.messages.list_for_conversation(conversation.id)?;
                Ok(Some((conversation, messages)))
            }
            None => {
                let conversation = self.conversations.create(user_id)?;
                Ok(Some((conversation, Vec::new())))
            }
        }
    }

    /// Bump the conversation's last-updated timestamp.
    pub fn touch(&self, conversation_id: i64) -> Result<(), ChatError> {
        Ok(self.conversations.touch(conversation_id)?)
    }

    /// Append one message to a conversation.
    ///
    /// An invalid conversation id fails with a storage error; the failure
    /// propagates, it is not swallowed.
    pub fn append(
        &self,
        conversation_id: i64,
        user_id: Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, ChatError> {
        Ok(self
            .messages
            .create(conversation_id, user_id, role, content)?)
    }

    /// Project stored messages into the role/content pairs the classifier
    /// consumes. Timestamps and ids are dropped.
    pub fn flatten_history(messages: &[Message]) -> Vec<HistoryEntry> {
        messages.iter().map(HistoryEntry::from).collect()
    }
}
