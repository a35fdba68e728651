//! Fixed-window request throttling for the auth endpoints.
//!
//! Registration and login get small per-minute budgets. The window state is
//! a pair of atomics; when the wall clock moves into a new window the count
//! starts over.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Budgeted request counter over fixed wall-clock windows.
#[derive(Clone)]
pub struct RateLimiter {
    /// Requests admitted per window.
    budget: u64,
    /// Window length in seconds.
    window_secs: u64,
    /// Requests seen in the active window.
    used: Arc<AtomicU64>,
    /// Index of the active window (epoch seconds / window length).
    epoch: Arc<AtomicU64>,
}

impl RateLimiter {
    /// A limiter admitting `budget` requests every `window_secs` seconds.
    pub fn new(budget: u64, window_secs: u64) -> Self {
        Self {
            budget,
            window_secs: window_secs.max(1),
            used: Arc::new(AtomicU64::new(0)),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether another request fits into the current window.
    fn admit(&self) -> bool {
        let window = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            / self.window_secs;

        if self.epoch.swap(window, Ordering::Relaxed) != window {
            // Fresh window: this request opens it.
            self.used.store(1, Ordering::Relaxed);
            return true;
        }

        self.used.fetch_add(1, Ordering::Relaxed) < self.budget
    }
}

/// Middleware wrapper around [`RateLimiter::admit`].
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.admit() {
        next.run(req).await
    } else {
        ApiError::TooManyRequests("Rate limit exceeded".to_string()).into_response()
    }
}
