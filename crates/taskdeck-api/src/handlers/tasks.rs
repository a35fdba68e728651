//! Task CRUD endpoints.
//!
//! All endpoints require authentication and enforce user ownership; a task
//! owned by someone else answers exactly like a missing one.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskdeck_core::types::{Task, TaskPriority, TaskStatus};
use taskdeck_storage::{NewTask, TaskFilter, TaskPatch, TaskRepository};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub status: TaskStatus,
    pub category_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub category_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub category_id: Option<Uuid>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// POST /api/v1/tasks - create a task for the authenticated user.
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let repo = TaskRepository::new(Arc::clone(&state.database));
    let task = repo.create(
        user_id,
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            category_id: req.category_id,
            due_date: req.due_date,
        },
    )?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/v1/tasks - list tasks with optional filters and pagination.
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<TaskListQuery>,
) -> Result<Json<TaskListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(20).min(100);
    let offset = params.offset.unwrap_or(0);

    let filter = TaskFilter {
        status: params.status,
        priority: params.priority,
        category_id: params.category_id,
    };

    let repo = TaskRepository::new(Arc::clone(&state.database));
    let (tasks, total) = repo.list_for_user(user_id, &filter, limit, offset)?;

    Ok(Json(TaskListResponse {
        tasks,
        total,
        limit,
        offset,
    }))
}

/// GET /api/v1/tasks/{id} - fetch one task.
pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let repo = TaskRepository::new(Arc::clone(&state.database));
    let task = repo
        .find_for_user(task_id, user_id)?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(task))
}

/// PUT /api/v1/tasks/{id} - partially update one task.
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<TaskUpdateRequest>,
) -> Result<Json<Task>, ApiError> {
    let repo = TaskRepository::new(Arc::clone(&state.database));
    let task = repo
        .update(
            task_id,
            user_id,
            TaskPatch {
                title: req.title,
                description: req.description,
                status: req.status,
                priority: req.priority,
                category_id: req.category_id,
                due_date: req.due_date,
            },
        )?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Ok(Json(task))
}

/// DELETE /api/v1/tasks/{id} - delete one task.
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = TaskRepository::new(Arc::clone(&state.database));
    if !repo.delete(task_id, user_id)? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
