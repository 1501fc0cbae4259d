//! Project handlers.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use chrono::Utc;

use super::dto::CreateProjectRequest;
use super::error::ApiErrorResponse;
use super::extract::AuthenticatedUser;
use super::handlers::AppState;
use crate::domain::{ProjectSeed, ProjectTree};

const LIST_FAILED: &str = "Failed to fetch projects";
const CREATE_FAILED: &str = "Failed to create project";

/// `GET /api/projects`: every project the caller owns, as full trees.
///
/// # Errors
///
/// 401 without a session, 500 when the read fails.
pub async fn list_projects(
    AuthenticatedUser(owner): AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectTree>>, ApiErrorResponse> {
    let trees = state
        .project_repository
        .list_trees(owner)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, LIST_FAILED))?;

    Ok(Json(trees))
}

/// `POST /api/projects`: creates a project with the default columns and
/// labels in one step.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed body or a failed write.
pub async fn create_project(
    AuthenticatedUser(owner): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<Json<ProjectTree>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, CREATE_FAILED))?;

    let seed = ProjectSeed::with_defaults(request.name, owner, Utc::now());
    let tree = state
        .project_repository
        .create_with_defaults(seed)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, CREATE_FAILED))?;

    tracing::info!(project_id = %tree.project.id, %owner, "Project created");
    Ok(Json(tree))
}
