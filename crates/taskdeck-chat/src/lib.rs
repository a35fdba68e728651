//! Conversational task management for Taskdeck.
//!
//! Implements the chat pipeline: conversation persistence, deterministic
//! intent classification over free-text messages, task mutations on behalf
//! of the classified intent, and final turn composition. There is no model
//! call anywhere in here; classification is ordered pattern matching.

pub mod classifier;
pub mod composer;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod types;

pub use classifier::IntentClassifier;
pub use composer::ResponseComposer;
pub use conversation::ConversationStore;
pub use error::ChatError;
pub use gateway::TaskGateway;
pub use types::{Action, ChatOutcome, Decision, HistoryEntry, ToolCall, ToolCallStatus};
