//! Application state and the health endpoint.

use std::sync::Arc;

use axum::Json;

use crate::infrastructure::{
    ColumnRepository, LabelRepository, ProjectRepository, Repositories, SessionRegistry,
    TaskRepository,
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Repositories are trait objects so the backend can be chosen at runtime by
/// `RepositoryFactory`.
#[derive(Clone)]
pub struct AppState {
    pub project_repository: Arc<dyn ProjectRepository + Send + Sync>,
    pub column_repository: Arc<dyn ColumnRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    pub label_repository: Arc<dyn LabelRepository + Send + Sync>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    #[must_use]
    pub fn new(repositories: Repositories, sessions: Arc<SessionRegistry>) -> Self {
        Self {
            project_repository: repositories.project_repository,
            column_repository: repositories.column_repository,
            task_repository: repositories.task_repository,
            label_repository: repositories.label_repository,
            sessions,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppState")
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint. Does not require a session.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_health_check_reports_version() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[rstest]
    fn test_app_state_debug_counts_sessions() {
        let sessions = Arc::new(SessionRegistry::new());
        sessions.insert("token", crate::domain::UserId::generate());
        let state = AppState::new(Repositories::in_memory(), sessions);

        assert!(format!("{state:?}").contains("sessions: 1"));
    }
}
