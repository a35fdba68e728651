//! Registration, login, logout, and session endpoints.
//!
//! Issues HS256 access tokens on register/login, delivered both in the
//! response body and as an HttpOnly `jwt_token` cookie so browser and
//! bearer clients work against the same surface.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskdeck_storage::UserRepository;

use crate::auth::{
    cookie_value, create_access_token, decode_token, extract_token, hash_password,
    verify_password, TOKEN_COOKIE,
};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserInfo,
    pub token: String,
    pub expires_at: i64,
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let email = normalize_email(&req.email)?;
    if req.password.is_empty() {
        return Err(ApiError::UnprocessableEntity(
            "Password must not be empty".to_string(),
        ));
    }

    let users = UserRepository::new(Arc::clone(&state.database));
    if users.find_by_email(&email)?.is_some() {
        tracing::warn!(email, "Registration failed: email already exists");
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let hashed = hash_password(&req.password)?;
    let user = users.create(Uuid::new_v4(), &email, &hashed)?;
    tracing::info!(user_id = %user.id, email, "New user registered");

    auth_success_response(&state, user.id, &user.email)
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let email = req.email.trim().to_lowercase();

    let users = UserRepository::new(Arc::clone(&state.database));
    let Some(user) = users.find_by_email(&email)? else {
        tracing::warn!(email, "Login failed: user not found");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    if !verify_password(&req.password, &user.hashed_password) {
        tracing::warn!(email, "Login failed: invalid password");
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    auth_success_response(&state, user.id, &user.email)
}

/// POST /api/v1/auth/logout
pub async fn logout() -> Response {
    let clear = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        TOKEN_COOKIE
    );
    (
        [(SET_COOKIE, clear)],
        Json(serde_json::json!({ "message": "Logged out" })),
    )
        .into_response()
}

/// GET /api/v1/auth/session
///
/// Checks the cookie first, then the bearer header, and reports the
/// decoded session without requiring the user row (token inspection only).
pub async fn session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = cookie_value(&headers, TOKEN_COOKIE).or_else(|| {
        extract_token(&headers) // falls through to the bearer header
    });

    let Some(token) = token else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "session": null })),
        )
            .into_response();
    };

    match decode_token(&token, &state.config.auth.secret_key) {
        Ok(data) => Json(serde_json::json!({
            "session": {
                "user": {
                    "id": data.user_id.to_string(),
                    "email": data.email,
                },
                "token": token,
                "expires_at": data.exp,
            }
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Session check failed");
            (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "session": null })),
            )
                .into_response()
        }
    }
}

/// Issue a token, set the cookie, and shape the auth payload.
fn auth_success_response(
    state: &AppState,
    user_id: Uuid,
    email: &str,
) -> Result<Response, ApiError> {
    let expiry_minutes = state.config.auth.token_expiry_minutes;
    let (token, expires_at) = create_access_token(
        user_id,
        Some(email),
        expiry_minutes,
        &state.config.auth.secret_key,
    )?;

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        TOKEN_COOKIE,
        token,
        expiry_minutes * 60
    );

    let body = AuthResponse {
        user: UserInfo {
            id: user_id.to_string(),
            email: email.to_string(),
            // Display name defaults to the email local part.
            name: email.split('@').next().unwrap_or(email).to_string(),
        },
        token,
        expires_at,
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// Trim, lowercase, and shape-check an email address.
fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::UnprocessableEntity(
            "Invalid email address".to_string(),
        ));
    }
    Ok(email)
}
