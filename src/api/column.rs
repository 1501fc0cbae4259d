//! Column handlers.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};

use super::dto::{CreateColumnRequest, SuccessResponse, UpdateColumnRequest};
use super::error::ApiErrorResponse;
use super::extract::AuthenticatedUser;
use super::handlers::AppState;
use crate::domain::{Column, ColumnId};

const CREATE_FAILED: &str = "Failed to create column";
const UPDATE_FAILED: &str = "Failed to update column";
const DELETE_FAILED: &str = "Failed to delete column";

fn parse_id(id: &str, message: &'static str) -> Result<ColumnId, ApiErrorResponse> {
    id.parse()
        .map_err(|error| ApiErrorResponse::from_rejection(&error, message))
}

/// `POST /api/columns`: appends a column; its `order` is the number of
/// columns the project already has.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed body or a failed write.
pub async fn create_column(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    body: Result<Json<CreateColumnRequest>, JsonRejection>,
) -> Result<Json<Column>, ApiErrorResponse> {
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, CREATE_FAILED))?;

    let draft = Column::new(ColumnId::generate(), request.project_id, request.title, 0);
    let column = state
        .column_repository
        .append(draft)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, CREATE_FAILED))?;

    Ok(Json(column))
}

/// `PATCH /api/columns/:id`: renames a column.
///
/// # Errors
///
/// 401 without a session, 500 on a malformed request or a failed write.
pub async fn update_column(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateColumnRequest>, JsonRejection>,
) -> Result<Json<Column>, ApiErrorResponse> {
    let id = parse_id(&id, UPDATE_FAILED)?;
    let Json(request) =
        body.map_err(|rejection| ApiErrorResponse::from_rejection(&rejection, UPDATE_FAILED))?;

    let column = state
        .column_repository
        .update(id, request.into())
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, UPDATE_FAILED))?;

    Ok(Json(column))
}

/// `DELETE /api/columns/:id`: deletes a column with its tasks.
///
/// # Errors
///
/// 401 without a session, 409 for the last column of a project, 500
/// otherwise.
pub async fn delete_column(
    AuthenticatedUser(_): AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ApiErrorResponse> {
    let id = parse_id(&id, DELETE_FAILED)?;

    state
        .column_repository
        .delete(id)
        .await
        .map_err(|error| ApiErrorResponse::from_repository(&error, DELETE_FAILED))?;

    tracing::info!(column_id = %id, "Column deleted");
    Ok(Json(SuccessResponse::OK))
}
