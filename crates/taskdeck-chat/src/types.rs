//! Shared types for the chat pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use taskdeck_core::types::{Message, MessageRole};

/// The action a chat turn was classified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddTask,
    ListTasks,
    Chat,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AddTask => "add_task",
            Action::ListTasks => "list_tasks",
            Action::Chat => "chat",
        }
    }
}

/// Execution status of a tool call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Completed,
    Failed,
}

/// A structured record of one action the classifier performed (or attempted)
/// on the user's behalf, echoed back to the caller.
///
/// Ids are derived from the action kind plus a truncated user id; they are
/// intentionally not unique across requests.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
    pub status: ToolCallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// One role/content pair projected from stored history.
///
/// This is the lossy view handed to the classifier; timestamps and ids are
/// dropped on purpose.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// The classifier's verdict for one message: reply text, classified action,
/// extracted parameters, and any tool-call records produced along the way.
/// Transient; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
    pub action: Option<Action>,
    pub parameters: Map<String, Value>,
    pub requires_action_agent: bool,
}

impl Decision {
    /// A decision with no reply, no action, and no tool calls.
    pub fn empty() -> Self {
        Self {
            response: String::new(),
            tool_calls: Vec::new(),
            action: None,
            parameters: Map::new(),
            requires_action_agent: false,
        }
    }
}

/// The composed result of a chat turn, ready for the wire.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub conversation_id: i64,
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
}
