//! Error taxonomy for the HTTP surface.
//!
//! Every failed request answers with the same JSON shape: a stable
//! machine-readable code plus a human-readable message, at the status the
//! variant dictates.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use taskdeck_chat::ChatError;
use taskdeck_core::error::TaskdeckError;

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable code clients can branch on, e.g. "not_found".
    pub error: String,
    /// Explanatory text.
    pub message: String,
}

/// Request failure, one variant per status the API can answer with.
#[derive(Debug)]
pub enum ApiError {
    /// 400: malformed identifiers or parameters.
    BadRequest(String),
    /// 401: missing or invalid credentials.
    Unauthorized(String),
    /// 403: authenticated, but not allowed to act as this user.
    Forbidden(String),
    /// 404: absent or not owned; the two are indistinguishable.
    NotFound(String),
    /// 409: state conflict, e.g. a duplicate email.
    Conflict(String),
    /// 422: well-formed request that fails semantic validation.
    UnprocessableEntity(String),
    /// 429: rate limit exceeded.
    TooManyRequests(String),
    /// 500: nothing the caller can fix.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::UnprocessableEntity(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_entity", msg)
            }
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "too_many_requests", msg)
            }
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TaskdeckError> for ApiError {
    fn from(err: TaskdeckError) -> Self {
        match err {
            TaskdeckError::Validation(msg) => ApiError::UnprocessableEntity(msg),
            TaskdeckError::NotFound(msg) => ApiError::NotFound(msg),
            TaskdeckError::Auth(msg) => ApiError::Unauthorized(msg),
            TaskdeckError::Config(msg) => ApiError::Internal(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        // Anything the chat pipeline lets escape is a persistence failure.
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_422() {
        let err: ApiError = TaskdeckError::Validation("empty".to_string()).into();
        assert!(matches!(err, ApiError::UnprocessableEntity(_)));
    }

    #[test]
    fn test_storage_maps_to_500() {
        let err: ApiError = TaskdeckError::Storage("locked".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn test_chat_error_maps_to_500() {
        let err: ApiError = ChatError::Storage("fk violation".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
