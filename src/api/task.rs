//! Task handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::Utc;

use super::dto::{CreateTaskRequest, SuccessResponse, UpdateTaskRequest};
use super::error::ApiErrorResponse;
use super::extract::AuthenticatedUser;
use super::handlers::AppState;
use crate::domain::{Task, TaskId};

const CREATE_FAILED: &str = "Failed to create task";
const UPDATE_FAILED: &str = "Failed to update task";
const DELETE_FAILED: &str = "Failed to delete task";
const DUPLICATE_FAILED: &str = "Failed to duplicate task";
const NOT_FOUND: &str = "Task not found";

fn parse_id(id: &str, message: &'static str) -> Result<TaskId, ApiErrorResponse> {
    id.parse()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, message))
}

/// `POST /api/tasks`: appends a task to a column.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed body, an unknown priority or
/// date, or a failed write.
pub async fn create_task(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, CREATE_FAILED))?;
    let priority = request
        .priority()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, CREATE_FAILED))?;
    let due_date = request
        .due_date()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, CREATE_FAILED))?;

    let draft = Task::new(
        TaskId::generate(),
        request.column_id,
        request.title,
        0,
        Utc::now(),
    )
    .with_description(request.description)
    .with_priority(priority)
    .with_due_date(due_date);

    let task = state
        .task_repository
        .append(draft)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, CREATE_FAILED))?;

    Ok(Json(task))
}

/// `PATCH /api/tasks/:id`: applies the fields present in the body.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed request or a failed write.
pub async fn update_task(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiErrorResponse> {
    let id = parse_id(&id, UPDATE_FAILED)?;
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, UPDATE_FAILED))?;
    let update = request
        .into_update()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, UPDATE_FAILED))?;

    let task = state
        .task_repository
        .update(id, update, Utc::now())
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, UPDATE_FAILED))?;

    Ok(Json(task))
}

/// `DELETE /api/tasks/:id`.
///
/// # Errors
///
/// 401 without a session, 500 when the task cannot be deleted.
pub async fn delete_task(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiErrorResponse> {
    let id = parse_id(&id, DELETE_FAILED)?;

    state
        .task_repository
        .delete(id)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DELETE_FAILED))?;

    Ok(Json(SuccessResponse::OK))
}

/// `POST /api/tasks/:id`: copies a task into the end of its column.
///
/// The copy's title gets the `" (copy)"` suffix; labels are not copied.
///
/// # Errors
///
/// 401 without a session, 404 when the source does not exist, 500 when the
/// write fails.
pub async fn duplicate_task(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiErrorResponse> {
    // An unparseable id cannot name an existing task.
    let Ok(id) = id.parse::<TaskId>() else {
        return Err(ApiErrorResponse::not_found(NOT_FOUND));
    };

    let source = state
        .task_repository
        .find_by_id(id)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DUPLICATE_FAILED))?
        .ok_or_else(|| ApiErrorResponse::not_found(NOT_FOUND))?;

    let task = state
        .task_repository
        .append(source.duplicate(TaskId::generate(), 0, Utc::now()))
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DUPLICATE_FAILED))?;

    tracing::debug!(source_id = %id, task_id = %task.id, "Task duplicated");
    Ok(Json(task))
}
