//! Route table and server startup.
//!
//! The public auth surface and the protected resource routes are built as
//! separate routers and merged under one middleware stack (CORS, tracing,
//! body limit). Protected handlers authenticate through the
//! [`AuthUser`](crate::auth::AuthUser) extractor rather than a blanket
//! middleware, since the chat endpoint needs the identity itself.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Assemble the application router.
pub fn create_router(state: AppState) -> Router {
    // CORS: allow the local frontend origins with credentials, since the
    // token also travels as a cookie.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    // Registration gets a tighter limit than login.
    let register_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(RateLimiter::new(5, 60)));

    let login_routes = Router::new()
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .layer(axum::middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(RateLimiter::new(10, 60)));

    // Routes that do not require an authenticated user.
    let public_routes = Router::new()
        .route("/", get(handlers::health))
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/session", get(handlers::auth::session))
        .merge(register_routes)
        .merge(login_routes);

    // Ownership-scoped resources; each handler authenticates via AuthUser.
    let protected_routes = Router::new()
        .route(
            "/api/v1/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::list_tasks),
        )
        .route(
            "/api/v1/tasks/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route(
            "/api/v1/categories",
            post(handlers::categories::create_category)
                .get(handlers::categories::list_categories),
        )
        .route(
            "/api/v1/categories/{id}",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/api/{user_id}/chat", post(handlers::chat::chat));

    public_routes
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB global limit
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn start_server(state: AppState) -> Result<(), taskdeck_core::TaskdeckError> {
    let addr = format!(
        "{}:{}",
        state.config.server.host, state.config.server.port
    );

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| taskdeck_core::TaskdeckError::Config(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| taskdeck_core::TaskdeckError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
