//! Final turn composition and persistence.
//!
//! Persists the user/assistant message pair for a chat turn and shapes the
//! structured reply. Persistence failures propagate; there is no
//! partial-success mode — if the assistant message cannot be written the
//! whole request fails.

use std::sync::Arc;

use uuid::Uuid;

use taskdeck_core::types::MessageRole;
use taskdeck_storage::{Database, MessageRepository};

use crate::error::ChatError;
use crate::types::{ChatOutcome, ToolCall};

/// Composes the final chat payload and writes both turns of the exchange.
pub struct ResponseComposer {
    messages: MessageRepository,
}

impl ResponseComposer {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            messages: MessageRepository::new(db),
        }
    }

    /// Persist the exchange and return the wire-ready outcome.
    ///
    /// Writes exactly two messages in order — the user's message, then the
    /// assistant reply — both attributed to the given user and
    /// conversation. The conversation's updated-at timestamp is not touched
    /// here; that is the orchestrator's concern.
    pub fn compose(
        &self,
        user_id: Uuid,
        conversation_id: i64,
        user_message: &str,
        reply: &str,
        tool_calls: Vec<ToolCall>,
    ) -> Result<ChatOutcome, ChatError> {
        self.messages
            .create(conversation_id, user_id, MessageRole::User, user_message)?;
        self.messages
            .create(conversation_id, user_id, MessageRole::Assistant, reply)?;

        Ok(ChatOutcome {
            conversation_id,
            response: reply.to_string(),
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationStore;
    use taskdeck_storage::UserRepository;

    fn make_db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn make_user(db: &Arc<Database>) -> Uuid {
        let repo = UserRepository::new(Arc::clone(db));
        let id = Uuid::new_v4();
        repo.create(id, &format!("{}@example.test", id.simple()), "hash")
            .unwrap();
        id
    }

    #[test]
    fn test_compose_persists_both_turns_in_order() {
        let db = make_db();
        let user = make_user(&db);
        let store = ConversationStore::new(Arc::clone(&db));
        let composer = ResponseComposer::new(Arc::clone(&db));

        let (conv, _) = store.resolve(user, None).unwrap().unwrap();
        let outcome = composer
            .compose(user, conv.id, "add task buy milk", "done!", Vec::new())
            .unwrap();

        assert_eq!(outcome.conversation_id, conv.id);
        assert_eq!(outcome.response, "done!");

        let (_, messages) = store.resolve(user, Some(conv.id)).unwrap().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].content, "add task buy milk");
        assert_eq!(messages[0].user_id, user);
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "done!");
        assert_eq!(messages[1].user_id, user);
    }

    #[test]
    fn test_compose_invalid_conversation_propagates() {
        let db = make_db();
        let user = make_user(&db);
        let composer = ResponseComposer::new(db);

        let result = composer.compose(user, 999_999, "hi", "hello", Vec::new());
        assert!(matches!(result, Err(ChatError::Storage(_))));
    }

    #[test]
    fn test_compose_carries_tool_calls_through() {
        let db = make_db();
        let user = make_user(&db);
        let store = ConversationStore::new(Arc::clone(&db));
        let composer = ResponseComposer::new(Arc::clone(&db));

        let (conv, _) = store.resolve(user, None).unwrap().unwrap();
        let tool_calls = vec![crate::types::ToolCall {
            id: "tc_list_deadbeef".to_string(),
            name: "list_tasks".to_string(),
            input: serde_json::Map::new(),
            status: crate::types::ToolCallStatus::Completed,
            result: None,
        }];

        let outcome = composer
            .compose(user, conv.id, "list", "no tasks", tool_calls)
            .unwrap();
        assert_eq!(outcome.tool_calls.len(), 1);
        assert_eq!(outcome.tool_calls[0].id, "tc_list_deadbeef");
    }
}
