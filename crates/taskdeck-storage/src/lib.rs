//! SQLite-backed persistence for Taskdeck.
//!
//! Provides the thread-safe [`Database`] wrapper, schema migrations, and
//! repositories for users, conversations, messages, tasks, and categories.
//! Every query that touches user-owned data is filtered by the owning user
//! id; a row owned by someone else is indistinguishable from a missing row.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod tasks;

pub use db::Database;
pub use repository::{ConversationRepository, MessageRepository, UserRepository};
pub use tasks::{
    CategoryPatch, CategoryRepository, NewCategory, NewTask, TaskFilter, TaskPatch,
    TaskRepository,
};
