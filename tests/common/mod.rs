//! Common test helpers for integration tests.
//!
//! The `#![allow(dead_code)]` attribute is necessary because each integration
//! test file is compiled as a separate crate and uses only part of this module.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use taskflow::api::{AppState, build_router};
use taskflow::domain::UserId;
use taskflow::infrastructure::{Repositories, SessionRegistry};

/// Bearer token of the user returned by [`create_test_app_state`].
pub const TOKEN: &str = "owner-token";

/// Bearer token of a second user.
pub const OTHER_TOKEN: &str = "other-token";

// =============================================================================
// AppState Creation Helpers
// =============================================================================

/// Creates an `AppState` backed by the in-memory store with two sessions.
pub fn create_test_app_state() -> (AppState, UserId) {
    let owner = UserId::generate();
    let sessions = SessionRegistry::new();
    sessions.insert(TOKEN, owner);
    sessions.insert(OTHER_TOKEN, UserId::generate());

    (
        AppState::new(Repositories::in_memory(), Arc::new(sessions)),
        owner,
    )
}

pub fn create_test_router() -> Router {
    build_router(create_test_app_state().0)
}

/// Serves the router on an ephemeral local port and returns its base URL.
pub async fn spawn_server(state: AppState) -> String {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let address = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });

    format!("http://{address}")
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Sends one request through the router and decodes the JSON response.
///
/// A `None` body sends no payload; `token` of `None` omits the header.
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Sends raw text as a JSON request body.
pub async fn send_raw(
    router: &Router,
    method: &str,
    uri: &str,
    body: &str,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Creates a project as the default session and returns its tree.
pub async fn create_project(router: &Router, name: &str) -> Value {
    let (status, tree) = send(
        router,
        "POST",
        "/api/projects",
        Some(TOKEN),
        Some(serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    tree
}

/// Creates a task and returns it.
pub async fn create_task(router: &Router, column_id: &str, title: &str) -> Value {
    let (status, task) = send(
        router,
        "POST",
        "/api/tasks",
        Some(TOKEN),
        Some(serde_json::json!({ "columnId": column_id, "title": title })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    task
}

/// Id of the column with `title` in a project tree.
pub fn column_id(tree: &Value, title: &str) -> String {
    tree["columns"]
        .as_array()
        .unwrap()
        .iter()
        .find(|column| column["title"] == title)
        .map(|column| column["id"].as_str().unwrap().to_string())
        .unwrap()
}

/// Id of the label with `name` in a project tree.
pub fn label_id(tree: &Value, name: &str) -> String {
    tree["labels"]
        .as_array()
        .unwrap()
        .iter()
        .find(|label| label["name"] == name)
        .map(|label| label["id"].as_str().unwrap().to_string())
        .unwrap()
}

/// The caller's projects as returned by `GET /api/projects`.
pub async fn list_projects(router: &Router) -> Vec<Value> {
    let (status, projects) = send(router, "GET", "/api/projects", Some(TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    projects.as_array().unwrap().clone()
}
