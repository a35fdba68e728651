//! Error types for the chat pipeline.

use taskdeck_core::error::TaskdeckError;

/// Errors from the chat pipeline.
///
/// Persistence failures propagate out of the composer and conversation
/// store; gateway failures are caught inside the classifier's add/list
/// branches and turned into conversational text instead.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("task action error: {0}")]
    TaskAction(String),
}

impl From<TaskdeckError> for ChatError {
    fn from(err: TaskdeckError) -> Self {
        match err {
            TaskdeckError::Validation(msg) => ChatError::TaskAction(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}
