//! JWT authentication and password hashing.
//!
//! Provides HS256 token issuance/validation, bcrypt password helpers, and
//! the [`AuthUser`] extractor protected handlers use to obtain the
//! authenticated user id. Tokens are accepted from the `Authorization:
//! Bearer` header or the `jwt_token` cookie.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use taskdeck_core::error::TaskdeckError;
use taskdeck_storage::UserRepository;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the cookie carrying the JWT for browser clients.
pub const TOKEN_COOKIE: &str = "jwt_token";

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: String,
    /// Expiration as a unix timestamp.
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Parsed token payload data.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub exp: i64,
}

/// Create a signed access token for a user.
pub fn create_access_token(
    user_id: Uuid,
    email: Option<&str>,
    expiry_minutes: i64,
    secret: &str,
) -> Result<(String, i64), TaskdeckError> {
    let expires_at = (Utc::now() + Duration::minutes(expiry_minutes)).timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expires_at,
        email: email.map(|e| e.to_string()),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TaskdeckError::Auth(format!("Failed to encode token: {}", e)))?;

    Ok((token, expires_at))
}

/// Decode and validate a token, returning its payload.
pub fn decode_token(token: &str, secret: &str) -> Result<TokenData, TaskdeckError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| TaskdeckError::Auth(format!("Invalid token: {}", error_category(&e))))?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| TaskdeckError::Auth("Token missing user identifier".to_string()))?;

    Ok(TokenData {
        user_id,
        email: data.claims.email,
        exp: data.claims.exp,
    })
}

/// Categorize a JWT error for logging without leaking token internals.
fn error_category(err: &jsonwebtoken::errors::Error) -> &'static str {
    use jsonwebtoken::errors::ErrorKind;
    match err.kind() {
        ErrorKind::ExpiredSignature => "expired_token",
        ErrorKind::InvalidSignature => "invalid_signature",
        ErrorKind::InvalidAudience => "invalid_audience",
        ErrorKind::InvalidIssuer => "invalid_issuer",
        _ => "invalid_token",
    }
}

/// Hash a password with bcrypt.
pub fn hash_password(password: &str) -> Result<String, TaskdeckError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| TaskdeckError::Auth(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash.
///
/// Any verification failure (including a malformed hash) is treated as a
/// mismatch rather than an error.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    if hashed.is_empty() {
        tracing::error!("Verification failed: stored password hash is empty");
        return false;
    }
    match bcrypt::verify(password, hashed) {
        Ok(ok) => ok,
        Err(e) => {
            tracing::error!(error = %e, "Password verification error");
            false
        }
    }
}

/// Extract the value of a named cookie from request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(|v| v.to_string());
        }
    }
    None
}

/// Extract a bearer token from the Authorization header, falling back to
/// the `jwt_token` cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        if let Ok(s) = value.to_str() {
            if let Some(token) = s.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }
    cookie_value(headers, TOKEN_COOKIE)
}

/// The authenticated user, resolved from the request's credentials.
///
/// Decoding the token is not enough: the user must still exist in the
/// database, so a token issued before a reset cannot reference a vanished
/// account and trip foreign keys later.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            return Err(ApiError::Unauthorized("Not authenticated".to_string()));
        };

        let token_data = decode_token(&token, &state.config.auth.secret_key).map_err(|e| {
            tracing::warn!(error = %e, "Token verification failed");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let users = UserRepository::new(Arc::clone(&state.database));
        match users.find_by_id(token_data.user_id) {
            Ok(Some(_)) => {
                tracing::debug!(user_id = %token_data.user_id, "Token verified");
                Ok(AuthUser(token_data.user_id))
            }
            Ok(None) => {
                tracing::warn!(
                    user_id = %token_data.user_id,
                    "Authentication failed: user not found"
                );
                Err(ApiError::Unauthorized(
                    "User session invalid. Please log in again.".to_string(),
                ))
            }
            Err(e) => Err(ApiError::Internal(e.to_string())),
        }
    }
}
