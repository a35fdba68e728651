//! Integration tests for the Taskdeck API.
//!
//! Covers authentication, task/category CRUD with ownership enforcement,
//! and the chat endpoint's orchestration contract (status codes, turn
//! persistence, intent behavior). Each test builds its own in-memory state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use taskdeck_api::{create_router, AppState};
use taskdeck_core::config::AppConfig;
use taskdeck_core::types::MessageRole;
use taskdeck_storage::{Database, MessageRepository};

// =============================================================================
// Helpers
// =============================================================================

/// Create a fresh AppState with an in-memory DB.
fn make_state() -> AppState {
    let config = AppConfig::default();
    let db = Database::in_memory().unwrap();
    AppState::new(config, db)
}

fn make_app(state: &AppState) -> axum::Router {
    create_router(state.clone())
}

/// Build a JSON request with optional bearer auth.
fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build a bodyless request with optional bearer auth.
fn bare_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Read full response body as JSON.
async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user and return (token, user_id).
async fn register(app: &axum::Router, email: &str) -> (String, String) {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "email": email, "password": "s3cret-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// POST a chat message, returning (status, body).
async fn post_chat(
    app: &axum::Router,
    token: &str,
    user_id: &str,
    body: Value,
) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/{}/chat", user_id),
            Some(token),
            body,
        ))
        .await
        .unwrap();
    let status = resp.status();
    (status, body_json(resp).await)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let state = make_state();
    let app = make_app(&state);

    let resp = app
        .oneshot(bare_request("GET", "/", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "Taskdeck API");
}

// =============================================================================
// Auth endpoints
// =============================================================================

#[tokio::test]
async fn test_register_issues_token_and_cookie() {
    let state = make_state();
    let app = make_app(&state);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "email": "Alice@Example.Test", "password": "pw123456" }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("jwt_token="));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(resp).await;
    // Email is normalized to lowercase; name is the local part.
    assert_eq!(body["user"]["email"], "alice@example.test");
    assert_eq!(body["user"]["name"], "alice");
    assert!(body["token"].as_str().unwrap().contains('.'));
    assert!(body["expires_at"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let state = make_state();
    let app = make_app(&state);

    register(&app, "dup@example.test").await;
    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "email": "dup@example.test", "password": "other" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_invalid_email_rejected() {
    let state = make_state();
    let app = make_app(&state);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            json!({ "email": "not-an-email", "password": "pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_register_rate_limited() {
    let state = make_state();
    let app = make_app(&state);

    // The register budget is 5 per minute, counted before the handler runs.
    // These requests fail email validation, so they are cheap and fast:
    // twelve of them cannot spread thinner than six per window even if a
    // window boundary falls mid-loop, so at least one must be throttled.
    let mut throttled = 0;
    for _ in 0..12 {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                None,
                json!({ "email": "not-an-email", "password": "pw" }),
            ))
            .await
            .unwrap();
        if resp.status() == StatusCode::TOO_MANY_REQUESTS {
            throttled += 1;
            let body = body_json(resp).await;
            assert_eq!(body["error"], "too_many_requests");
        } else {
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
    assert!(throttled > 0);
}

#[tokio::test]
async fn test_login_round_trip() {
    let state = make_state();
    let app = make_app(&state);

    register(&app, "bob@example.test").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": "bob@example.test", "password": "s3cret-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"]["email"], "bob@example.test");

    // Wrong password and unknown email both come back as the same 401.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": "bob@example.test", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": "ghost@example.test", "password": "s3cret-pw" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_with_bearer_token() {
    let state = make_state();
    let app = make_app(&state);

    let (token, user_id) = register(&app, "carol@example.test").await;

    let resp = app
        .clone()
        .oneshot(bare_request("GET", "/api/v1/auth/session", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session"]["user"]["id"], user_id.as_str());

    // No credential at all.
    let resp = app
        .oneshot(bare_request("GET", "/api/v1/auth/session", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(resp).await;
    assert!(body["session"].is_null());
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let state = make_state();
    let app = make_app(&state);

    let resp = app
        .oneshot(bare_request("POST", "/api/v1/auth/logout", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

// =============================================================================
// Task CRUD
// =============================================================================

#[tokio::test]
async fn test_tasks_require_authentication() {
    let state = make_state();
    let app = make_app(&state);

    let resp = app
        .oneshot(bare_request("GET", "/api/v1/tasks", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_task_crud_happy_path() {
    let state = make_state();
    let app = make_app(&state);
    let (token, _) = register(&app, "dora@example.test").await;

    // Create.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            json!({ "title": "write report", "priority": "high" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let task = body_json(resp).await;
    assert_eq!(task["title"], "write report");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "high");
    let task_id = task["id"].as_str().unwrap().to_string();

    // Read.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "GET",
            &format!("/api/v1/tasks/{}", task_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Update: completing stamps completed_at.
    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/tasks/{}", task_id),
            Some(&token),
            json!({ "status": "completed" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["status"], "completed");
    assert!(!updated["completed_at"].is_null());

    // Delete.
    let resp = app
        .clone()
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/v1/tasks/{}", task_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Gone.
    let resp = app
        .oneshot(bare_request(
            "GET",
            &format!("/api/v1/tasks/{}", task_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_create_empty_title_rejected() {
    let state = make_state();
    let app = make_app(&state);
    let (token, _) = register(&app, "erin@example.test").await;

    let resp = app
        .oneshot(json_request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            json!({ "title": "   " }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_task_ownership_isolation() {
    let state = make_state();
    let app = make_app(&state);
    let (alice_token, _) = register(&app, "alice@example.test").await;
    let (bob_token, _) = register(&app, "bob@example.test").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tasks",
            Some(&alice_token),
            json!({ "title": "alice's task" }),
        ))
        .await
        .unwrap();
    let task = body_json(resp).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // Bob cannot see, update, or delete it; all 404, never 403.
    for (method, body) in [
        ("GET", None),
        ("PUT", Some(json!({ "title": "stolen" }))),
        ("DELETE", None),
    ] {
        let req = match body {
            Some(b) => json_request(
                method,
                &format!("/api/v1/tasks/{}", task_id),
                Some(&bob_token),
                b,
            ),
            None => bare_request(
                method,
                &format!("/api/v1/tasks/{}", task_id),
                Some(&bob_token),
            ),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "method {}", method);
    }

    // Bob's listing is empty.
    let resp = app
        .oneshot(bare_request("GET", "/api/v1/tasks", Some(&bob_token)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_task_list_filters_and_pagination() {
    let state = make_state();
    let app = make_app(&state);
    let (token, _) = register(&app, "frank@example.test").await;

    for i in 0..3 {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/tasks",
                Some(&token),
                json!({ "title": format!("task {}", i) }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .clone()
        .oneshot(bare_request(
            "GET",
            "/api/v1/tasks?limit=2&offset=0",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
    // Newest first.
    assert_eq!(body["tasks"][0]["title"], "task 2");

    let resp = app
        .oneshot(bare_request(
            "GET",
            "/api/v1/tasks?status=completed",
            Some(&token),
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 0);
}

// =============================================================================
// Category CRUD
// =============================================================================

#[tokio::test]
async fn test_category_crud_happy_path() {
    let state = make_state();
    let app = make_app(&state);
    let (token, _) = register(&app, "gus@example.test").await;

    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/categories",
            Some(&token),
            json!({ "name": "errands", "description": "out and about" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let category = body_json(resp).await;
    let category_id = category["id"].as_str().unwrap().to_string();

    // Listing uses the items envelope, sorted by name.
    let resp = app
        .clone()
        .oneshot(bare_request("GET", "/api/v1/categories", Some(&token)))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "errands");

    // A task can reference the category.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/tasks",
            Some(&token),
            json!({ "title": "groceries", "category_id": category_id }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/categories/{}", category_id),
            Some(&token),
            json!({ "name": "out-of-house" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(bare_request(
            "DELETE",
            &format!("/api/v1/categories/{}", category_id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

// =============================================================================
// Chat endpoint: status codes and orchestration
// =============================================================================

#[tokio::test]
async fn test_chat_new_conversation_created_then_resumed() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "hana@example.test").await;

    // No conversation_id: a new session, 201.
    let (status, body) = post_chat(&app, &token, &user_id, json!({ "message": "hello there" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation_id = body["conversation_id"].as_i64().unwrap();
    assert!(conversation_id > 0);

    // Resuming the same conversation: 200, same id echoed back.
    let (status, body) = post_chat(
        &app,
        &token,
        &user_id,
        json!({ "conversation_id": conversation_id, "message": "hello again" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conversation_id"].as_i64().unwrap(), conversation_id);
}

#[tokio::test]
async fn test_chat_identity_mismatch_forbidden() {
    let state = make_state();
    let app = make_app(&state);
    let (_alice_token, alice_id) = register(&app, "alice@example.test").await;
    let (bob_token, _) = register(&app, "bob@example.test").await;

    // Bob's credentials against Alice's path: always 403.
    let (status, _) = post_chat(&app, &bob_token, &alice_id, json!({ "message": "list" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_chat_malformed_user_id_bad_request() {
    let state = make_state();
    let app = make_app(&state);
    let (token, _) = register(&app, "ivan@example.test").await;

    let (status, _) = post_chat(&app, &token, "not-a-uuid", json!({ "message": "list" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_unknown_and_foreign_conversation_both_404() {
    let state = make_state();
    let app = make_app(&state);
    let (alice_token, alice_id) = register(&app, "alice@example.test").await;
    let (bob_token, bob_id) = register(&app, "bob@example.test").await;

    // Alice opens a conversation.
    let (_, body) = post_chat(&app, &alice_token, &alice_id, json!({ "message": "hi" })).await;
    let alice_conv = body["conversation_id"].as_i64().unwrap();

    // Bob resuming Alice's conversation under his own identity: 404.
    let (status, _) = post_chat(
        &app,
        &bob_token,
        &bob_id,
        json!({ "conversation_id": alice_conv, "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A conversation id that exists for nobody: the same 404.
    let (status, _) = post_chat(
        &app,
        &bob_token,
        &bob_id,
        json!({ "conversation_id": 999_999, "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_empty_message_rejected() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "june@example.test").await;

    let (status, _) = post_chat(&app, &token, &user_id, json!({ "message": "   " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Missing message field entirely: rejected by body deserialization.
    let resp = app
        .oneshot(json_request(
            "POST",
            &format!("/api/{}/chat", user_id),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_chat_unauthenticated_rejected_without_side_effects() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "kate@example.test").await;

    // No credential: 401 before anything is created.
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/{}/chat", user_id),
            None,
            json!({ "message": "add task sneak in" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The first authenticated chat gets conversation id 1: nothing was
    // created by the rejected call.
    let (status, body) = post_chat(&app, &token, &user_id, json!({ "message": "hello there" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["conversation_id"].as_i64().unwrap(), 1);

    // And no task snuck in either.
    let resp = app
        .oneshot(bare_request("GET", "/api/v1/tasks", Some(&token)))
        .await
        .unwrap();
    let tasks = body_json(resp).await;
    assert_eq!(tasks["total"], 0);
}

// =============================================================================
// Chat endpoint: intents
// =============================================================================

#[tokio::test]
async fn test_chat_add_intent_creates_task() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "liam@example.test").await;

    let (status, body) = post_chat(
        &app,
        &token,
        &user_id,
        json!({ "message": "add task buy milk" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["response"],
        "✅ Success! I've added the task: 'buy milk'"
    );

    let tool_calls = body["tool_calls"].as_array().unwrap();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0]["name"], "add_task");
    assert_eq!(tool_calls[0]["status"], "completed");
    assert_eq!(tool_calls[0]["input"]["title"], "buy milk");
    assert_eq!(
        tool_calls[0]["id"],
        format!("tc_add_{}", &user_id[..8]).as_str()
    );
    assert_eq!(tool_calls[0]["result"]["title"], "buy milk");

    // The task is visible through the regular CRUD surface.
    let resp = app
        .oneshot(bare_request("GET", "/api/v1/tasks", Some(&token)))
        .await
        .unwrap();
    let tasks = body_json(resp).await;
    assert_eq!(tasks["total"], 1);
    assert_eq!(tasks["tasks"][0]["title"], "buy milk");
    assert_eq!(tasks["tasks"][0]["priority"], "medium");
    assert_eq!(tasks["tasks"][0]["status"], "pending");
}

#[tokio::test]
async fn test_chat_remember_to_strips_leading_to() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "mia@example.test").await;

    let (_, body) = post_chat(
        &app,
        &token,
        &user_id,
        json!({ "message": "remember to call mom" }),
    )
    .await;
    assert_eq!(body["tool_calls"][0]["input"]["title"], "call mom");
}

#[tokio::test]
async fn test_chat_whatever_classifies_as_list() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "nina@example.test").await;

    // "whatever" contains "what": substring matching is intentional.
    let (status, body) = post_chat(&app, &token, &user_id, json!({ "message": "whatever" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let tool_calls = body["tool_calls"].as_array().unwrap();
    assert_eq!(tool_calls.len(), 1);
    assert_eq!(tool_calls[0]["name"], "list_tasks");
    assert_eq!(
        tool_calls[0]["id"],
        format!("tc_list_{}", &user_id[..8]).as_str()
    );
    assert_eq!(body["response"], "You don't have any tasks in your list yet.");
}

#[tokio::test]
async fn test_chat_list_renders_recent_tasks() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "omar@example.test").await;

    for title in ["first", "second"] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/tasks",
                Some(&token),
                json!({ "title": title }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let (_, body) = post_chat(&app, &token, &user_id, json!({ "message": "show my tasks" })).await;
    assert_eq!(
        body["response"],
        "Here are your latest tasks:\n• second [pending]\n• first [pending]"
    );
    assert_eq!(body["tool_calls"][0]["result"]["count"], 2);
}

#[tokio::test]
async fn test_chat_fallback_fixed_reply() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "pia@example.test").await;

    let (status, body) = post_chat(&app, &token, &user_id, json!({ "message": "hello there" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["response"],
        "I'm your Todo Assistant! You can tell me things like 'add task buy bread' or 'show my tasks'."
    );
    assert_eq!(body["tool_calls"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Chat endpoint: turn persistence
// =============================================================================

#[tokio::test]
async fn test_chat_turn_atomicity_and_order() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "quin@example.test").await;

    let (_, body) = post_chat(
        &app,
        &token,
        &user_id,
        json!({ "message": "add task water plants" }),
    )
    .await;
    let conversation_id = body["conversation_id"].as_i64().unwrap();

    // Exactly two messages, user then assistant, both attributed correctly.
    let messages = MessageRepository::new(Arc::clone(&state.database))
        .list_for_conversation(conversation_id)
        .unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "add task water plants");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(
        messages[1].content,
        "✅ Success! I've added the task: 'water plants'"
    );
    for msg in &messages {
        assert_eq!(msg.conversation_id, conversation_id);
        assert_eq!(msg.user_id, Uuid::parse_str(&user_id).unwrap());
    }
}

#[tokio::test]
async fn test_chat_history_accumulates_across_turns() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "rosa@example.test").await;

    let (_, body) = post_chat(&app, &token, &user_id, json!({ "message": "hello there" })).await;
    let conversation_id = body["conversation_id"].as_i64().unwrap();

    post_chat(
        &app,
        &token,
        &user_id,
        json!({ "conversation_id": conversation_id, "message": "whatever" }),
    )
    .await;

    let messages = MessageRepository::new(Arc::clone(&state.database))
        .list_for_conversation(conversation_id)
        .unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].content, "hello there");
    assert_eq!(messages[2].content, "whatever");
}

#[tokio::test]
async fn test_chat_trims_message_before_persisting() {
    let state = make_state();
    let app = make_app(&state);
    let (token, user_id) = register(&app, "sven@example.test").await;

    let (_, body) = post_chat(
        &app,
        &token,
        &user_id,
        json!({ "message": "  hello there  " }),
    )
    .await;
    let conversation_id = body["conversation_id"].as_i64().unwrap();

    let messages = MessageRepository::new(Arc::clone(&state.database))
        .list_for_conversation(conversation_id)
        .unwrap();
    assert_eq!(messages[0].content, "hello there");
}
