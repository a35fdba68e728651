//! The chat endpoint: request-level orchestration of the pipeline.
//!
//! One request walks through: authenticate, resolve or create the
//! conversation, classify intent (executing any task mutation), persist the
//! turn, respond. Every step runs sequentially against the shared store;
//! there is no internal fan-out.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskdeck_chat::{
    ConversationStore, IntentClassifier, ResponseComposer, TaskGateway, ToolCall,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub conversation_id: i64,
    pub response: String,
    pub tool_calls: Vec<ToolCall>,
}

/// POST /api/{user_id}/chat
///
/// Status is 201 when this call created a new conversation, 200 when an
/// existing one was resumed. A supplied conversation id that does not
/// resolve for this user is a 404 whether it is someone else's or nobody's.
pub async fn chat(
    State(state): State<AppState>,
    AuthUser(current_user): AuthUser,
    Path(user_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<(StatusCode, Json<ChatResponse>), ApiError> {
    let started = Instant::now();

    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Message cannot be empty".to_string(),
        ));
    }

    let user_uuid = Uuid::parse_str(&user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id format".to_string()))?;

    if current_user != user_uuid {
        return Err(ApiError::Forbidden("User identity mismatch".to_string()));
    }

    let store = ConversationStore::new(Arc::clone(&state.database));
    let Some((conversation, messages)) = store.resolve(user_uuid, req.conversation_id)? else {
        return Err(ApiError::NotFound("Conversation not found".to_string()));
    };
    let created = req.conversation_id.is_none();

    let history = ConversationStore::flatten_history(&messages);
    let gateway = TaskGateway::new(Arc::clone(&state.database), user_uuid);
    let decision = IntentClassifier::classify(&gateway, &message, &history, user_uuid);

    let composer = ResponseComposer::new(Arc::clone(&state.database));
    let outcome = composer.compose(
        user_uuid,
        conversation.id,
        &message,
        &decision.response,
        decision.tool_calls,
    )?;

    store.touch(conversation.id)?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    tracing::info!(
        user_id = %user_uuid,
        conversation_id = conversation.id,
        action = ?decision.action,
        duration_ms = started.elapsed().as_millis() as u64,
        "Chat request completed"
    );

    Ok((
        status,
        Json(ChatResponse {
            conversation_id: outcome.conversation_id,
            response: outcome.response,
            tool_calls: outcome.tool_calls,
        }),
    ))
}
