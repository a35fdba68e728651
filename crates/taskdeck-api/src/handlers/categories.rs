//! Category CRUD endpoints.
//!
//! Same ownership rules as tasks. Deleting a category detaches its tasks
//! rather than deleting them.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskdeck_core::types::Category;
use taskdeck_storage::{CategoryPatch, CategoryRepository, NewCategory};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryCreateRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub items: Vec<Category>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

/// POST /api/v1/categories - create a category for the authenticated user.
pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CategoryCreateRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let repo = CategoryRepository::new(Arc::clone(&state.database));
    let category = repo.create(
        user_id,
        NewCategory {
            name: req.name,
            description: req.description,
        },
    )?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/v1/categories - list categories ordered by name.
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let limit = params.limit.unwrap_or(100).min(500);
    let offset = params.offset.unwrap_or(0);

    let repo = CategoryRepository::new(Arc::clone(&state.database));
    let (items, total) = repo.list_for_user(user_id, limit, offset)?;

    Ok(Json(CategoryListResponse {
        items,
        total,
        limit,
        offset,
    }))
}

/// GET /api/v1/categories/{id} - fetch one category.
pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let repo = CategoryRepository::new(Arc::clone(&state.database));
    let category = repo
        .find_for_user(category_id, user_id)?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    Ok(Json(category))
}

/// PUT /api/v1/categories/{id} - partially update one category.
pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
    Json(req): Json<CategoryUpdateRequest>,
) -> Result<Json<Category>, ApiError> {
    let repo = CategoryRepository::new(Arc::clone(&state.database));
    let category = repo
        .update(
            category_id,
            user_id,
            CategoryPatch {
                name: req.name,
                description: req.description,
            },
        )?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    Ok(Json(category))
}

/// DELETE /api/v1/categories/{id} - delete one category.
pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = CategoryRepository::new(Arc::clone(&state.database));
    if !repo.delete(category_id, user_id)? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
