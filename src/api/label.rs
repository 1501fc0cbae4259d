//! Label and task-label handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use super::dto::{CreateLabelRequest, SuccessResponse, TaskLabelRequest};
use super::error::ApiErrorResponse;
use super::extract::AuthenticatedUser;
use super::handlers::AppState;
use crate::domain::{Label, LabelId, TaskLabel};

const CREATE_FAILED: &str = "Failed to create label";
const DELETE_FAILED: &str = "Failed to delete label";
const ATTACH_FAILED: &str = "Failed to add label";
const DETACH_FAILED: &str = "Failed to remove label";

/// `POST /api/labels`.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed body or a failed write.
pub async fn create_label(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> Result<Json<Label>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, CREATE_FAILED))?;

    let label = Label::new(
        LabelId::generate(),
        request.project_id,
        request.name,
        request.color,
    );
    let label = state
        .label_repository
        .insert(label)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, CREATE_FAILED))?;

    Ok(Json(label))
}

/// `DELETE /api/labels/:id`: also detaches the label from every task.
///
/// # Errors
///
/// 401 without a session, 500 when the label cannot be deleted.
pub async fn delete_label(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiErrorResponse> {
    let id: LabelId = id
        .parse()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, DELETE_FAILED))?;

    state
        .label_repository
        .delete(id)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DELETE_FAILED))?;

    Ok(Json(SuccessResponse::OK))
}

/// `POST /api/task-labels`.
///
/// # Errors
///
/// 401 without a session, 409 when the label belongs to another project,
/// 500 when the pair is already attached or the write fails.
pub async fn attach_label(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<TaskLabelRequest>, JsonRejection>,
) -> Result<Json<TaskLabel>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, ATTACH_FAILED))?;

    let association = state
        .label_repository
        .attach(TaskLabel::new(request.task_id, request.label_id))
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, ATTACH_FAILED))?;

    Ok(Json(association))
}

/// `DELETE /api/task-labels`.
///
/// # Errors
///
/// 401 without a session, 500 when the pair is not attached.
pub async fn detach_label(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<TaskLabelRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, DETACH_FAILED))?;

    state
        .label_repository
        .detach(TaskLabel::new(request.task_id, request.label_id))
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DETACH_FAILED))?;

    Ok(Json(SuccessResponse::OK))
}
