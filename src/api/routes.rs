//! Router assembly.

use axum::Router;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::column::{create_column, delete_column, update_column};
use super::handlers::{AppState, health_check};
use super::label::{attach_label, create_label, delete_label, detach_label};
use super::project::{create_project, list_projects};
use super::task::{create_task, delete_task, duplicate_task, update_task};

/// Builds the application router with tracing and permissive CORS.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/projects", get(list_projects).post(create_project))
        .route("/api/columns", post(create_column))
        .route(
            "/api/columns/{id}",
            patch(update_column).delete(delete_column),
        )
        .route("/api/tasks", post(create_task))
        .route(
            "/api/tasks/{id}",
            patch(update_task).delete(delete_task).post(duplicate_task),
        )
        .route("/api/labels", post(create_label))
        .route("/api/labels/{id}", axum::routing::delete(delete_label))
        .route("/api/task-labels", post(attach_label).delete(detach_label))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
