//! Task mutation gateway for the classifier.
//!
//! A narrow, ownership-scoped facade over the task repository. The gateway
//! is bound to a single user id at construction; every call it makes is
//! implicitly filtered by that id. It covers only what intent execution
//! needs (create, recent listing) and is independent of the REST task
//! surface used by direct clients.

use std::sync::Arc;

use uuid::Uuid;

use taskdeck_core::types::{Task, TaskPriority, TaskStatus};
use taskdeck_storage::{Database, NewTask, TaskRepository};

use crate::error::ChatError;

/// Ownership-scoped task operations for one user.
pub struct TaskGateway {
    tasks: TaskRepository,
    user_id: Uuid,
}

impl TaskGateway {
    /// Bind a gateway to the given user.
    pub fn new(db: Arc<Database>, user_id: Uuid) -> Self {
        Self {
            tasks: TaskRepository::new(db),
            user_id,
        }
    }

    /// The user this gateway acts for.
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Create a task for the bound user.
    ///
    /// Title validation happens in the repository; an empty title comes
    /// back as a task-action error for the classifier to swallow.
    pub fn create(
        &self,
        title: &str,
        priority: TaskPriority,
        status: TaskStatus,
    ) -> Result<Task, ChatError> {
        let task = self.tasks.create(
            self.user_id,
            NewTask {
                title: title.to_string(),
                status,
                priority,
                ..NewTask::default()
            },
        )?;
        Ok(task)
    }

    /// The bound user's most recently created tasks, newest first.
    pub fn list_recent(&self, limit: u64) -> Result<Vec<Task>, ChatError> {
        Ok(self.tasks.list_recent(self.user_id, limit)?)
    }
}
