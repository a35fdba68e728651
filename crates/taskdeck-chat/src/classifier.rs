//! Deterministic intent classification for chat messages.
//!
//! No model call: intent is an ordered set of pattern rules over the
//! lowercased message, evaluated first-match-wins. The conversation history
//! is part of the interface but deliberately unused by the matching logic.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use taskdeck_core::types::{TaskPriority, TaskStatus};

use crate::gateway::TaskGateway;
use crate::types::{Action, Decision, HistoryEntry, ToolCall, ToolCallStatus};

/// Add-intent verb phrase: a trigger verb, optionally an article, optionally
/// the word "task", optionally "to", then the captured remainder. Searched
/// anywhere in the message, not anchored.
static ADD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:add|create|remember|new|remind)(?:\s+(?:a|the))?(?:\s+task)?(?:\s+to)?\s+(.+)")
        .expect("Invalid add-intent regex")
});

/// List-intent triggers, matched as plain substrings. "whatever" contains
/// "what" and therefore classifies as a list request; that looseness is
/// part of the contract.
const LIST_TRIGGERS: &[&str] = &["list", "show", "what", "tasks", "get"];

/// How many tasks a list reply shows.
const LIST_LIMIT: u64 = 5;

const ADD_FAILURE_REPLY: &str =
    "I'm sorry, I encountered an error while trying to add that task.";
const LIST_EMPTY_REPLY: &str = "You don't have any tasks in your list yet.";
const LIST_FAILURE_REPLY: &str = "I had some trouble retrieving your tasks. Please try again.";
const FALLBACK_REPLY: &str = "I'm your Todo Assistant! You can tell me things like \
                              'add task buy bread' or 'show my tasks'.";

/// The matched rule for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Intent {
    /// Add a task with the extracted title (possibly empty).
    Add(String),
    /// List recent tasks.
    List,
    /// Nothing matched; reply with usage help.
    Fallback,
}

/// Rule-based classifier that turns a message into a [`Decision`],
/// executing task mutations through the gateway as a side effect.
pub struct IntentClassifier;

impl IntentClassifier {
    /// Classify a message and execute the implied action.
    ///
    /// `history` is accepted for interface stability but does not influence
    /// matching. The classifier never fails outward: gateway errors are
    /// folded into the reply text and the method always returns a decision.
    pub fn classify(
        gateway: &TaskGateway,
        message: &str,
        history: &[HistoryEntry],
        user_id: Uuid,
    ) -> Decision {
        let _ = history;
        let message_lc = message.to_lowercase();

        match Self::detect(&message_lc) {
            Intent::Add(title) => Self::handle_add(gateway, title, user_id),
            Intent::List => Self::handle_list(gateway, user_id),
            Intent::Fallback => Self::handle_fallback(),
        }
    }

    /// Evaluate the rules in order; first match wins.
    fn detect(message_lc: &str) -> Intent {
        if let Some(caps) = ADD_RE.captures(message_lc) {
            let mut title = caps[1].trim().to_string();
            // The optional "to" group stops at the first alternative that
            // matches, so a leading "to " can survive into the capture.
            if let Some(rest) = title.strip_prefix("to ") {
                title = rest.trim().to_string();
            }
            return Intent::Add(title);
        }

        if LIST_TRIGGERS.iter().any(|k| message_lc.contains(k)) {
            return Intent::List;
        }

        Intent::Fallback
    }

    fn handle_add(gateway: &TaskGateway, title: String, user_id: Uuid) -> Decision {
        let mut decision = Decision::empty();

        let mut input = Map::new();
        input.insert("title".to_string(), Value::String(title.clone()));

        let mut tool_call = ToolCall {
            id: tool_call_id("tc_add_", user_id),
            name: "add_task".to_string(),
            input,
            status: ToolCallStatus::Completed,
            result: None,
        };

        match gateway.create(&title, TaskPriority::Medium, TaskStatus::Pending) {
            Ok(task) => {
                tool_call.result = Some(json!({
                    "id": task.id.to_string(),
                    "title": task.title,
                }));
                decision.response = format!("✅ Success! I've added the task: '{}'", task.title);
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %user_id, "Failed to add task");
                tool_call.status = ToolCallStatus::Failed;
                tool_call.result = Some(json!({ "error": e.to_string() }));
                decision.response = ADD_FAILURE_REPLY.to_string();
            }
        }

        decision.tool_calls.push(tool_call);
        decision.action = Some(Action::AddTask);
        decision
            .parameters
            .insert("title".to_string(), Value::String(title));
        decision.requires_action_agent = true;
        decision
    }

    fn handle_list(gateway: &TaskGateway, user_id: Uuid) -> Decision {
        let mut decision = Decision::empty();

        match gateway.list_recent(LIST_LIMIT) {
            Ok(tasks) => {
                let tool_call = ToolCall {
                    id: tool_call_id("tc_list_", user_id),
                    name: "list_tasks".to_string(),
                    input: Map::new(),
                    status: ToolCallStatus::Completed,
                    result: Some(json!({ "count": tasks.len() })),
                };

                if tasks.is_empty() {
                    decision.response = LIST_EMPTY_REPLY.to_string();
                } else {
                    let task_list = tasks
                        .iter()
                        .map(|t| format!("• {} [{}]", t.title, t.status.as_str()))
                        .collect::<Vec<_>>()
                        .join("\n");
                    decision.response = format!("Here are your latest tasks:\n{}", task_list);
                }

                decision.tool_calls.push(tool_call);
                decision.action = Some(Action::ListTasks);
                decision.requires_action_agent = true;
            }
            Err(e) => {
                // Unlike the add branch, no failed tool call is recorded.
                tracing::error!(error = %e, user_id = %user_id, "Failed to list tasks");
                decision.response = LIST_FAILURE_REPLY.to_string();
            }
        }

        decision
    }

    fn handle_fallback() -> Decision {
        let mut decision = Decision::empty();
        decision.response = FALLBACK_REPLY.to_string();
        decision.action = Some(Action::Chat);
        decision.requires_action_agent = false;
        decision
    }
}

/// Tool-call ids are the action prefix plus the first 8 characters of the
/// stringified user id. Collisions across requests from the same user are
/// expected.
fn tool_call_id(prefix: &str, user_id: Uuid) -> String {
    format!("{}{}", prefix, &user_id.to_string()[..8])
}
