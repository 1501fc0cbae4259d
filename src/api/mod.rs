//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod column;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod label;
pub mod project;
pub mod routes;
pub mod task;

pub use column::{create_column, delete_column, update_column};
pub use dto::{
    CreateColumnRequest, CreateLabelRequest, CreateProjectRequest, CreateTaskRequest,
    InvalidField, SuccessResponse, TaskLabelRequest, UpdateColumnRequest, UpdateTaskRequest,
};
pub use error::{ApiError, ApiErrorResponse};
pub use extract::AuthenticatedUser;
pub use handlers::{AppState, HealthResponse, health_check};
pub use label::{attach_label, create_label, delete_label, detach_label};
pub use project::{create_project, list_projects};
pub use routes::build_router;
pub use task::{create_task, delete_task, duplicate_task, update_task};
