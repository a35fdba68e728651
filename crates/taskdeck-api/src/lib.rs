//! Taskdeck API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API: registration/login/session endpoints, JWT
//! authentication, ownership-scoped task and category CRUD, and the chat
//! endpoint that drives the conversational task pipeline.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
