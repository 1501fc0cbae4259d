//! HTTP data-access layer for the signed-in user's project.
//!
//! [`ProjectClient`] owns one project tree. Every successful mutation merges
//! the entity the server returned into the tree by id and publishes a new
//! immutable snapshot; readers holding an older `Arc` keep a consistent view.
//! A failed mutation leaves the snapshot untouched.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::{
    ApiError, CreateColumnRequest, CreateLabelRequest, CreateProjectRequest, CreateTaskRequest,
    SuccessResponse, TaskLabelRequest, UpdateColumnRequest, UpdateTaskRequest,
};
use crate::domain::{
    BoardQuery, BoardStats, Column, ColumnId, ColumnTree, DEFAULT_PROJECT_NAME, Label, LabelId,
    ProjectId, ProjectTree, Task, TaskId, TaskLabel, TaskUpdate,
};

/// Errors returned by [`ProjectClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    /// A project-scoped mutation was attempted before a project was loaded.
    #[error("No project loaded")]
    NoProject,
}

/// Client for the board API, holding the current project snapshot.
#[derive(Debug)]
pub struct ProjectClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    snapshot: ArcSwapOption<ProjectTree>,
}

impl ProjectClient {
    /// Creates a client for the API at `base_url` (without trailing `/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, token)
    }

    #[must_use]
    pub fn with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            snapshot: ArcSwapOption::empty(),
        }
    }

    /// The current project tree, if one has been loaded.
    pub fn snapshot(&self) -> Option<Arc<ProjectTree>> {
        self.snapshot.load_full()
    }

    // -------------------------------------------------------------------------
    // Loading
    // -------------------------------------------------------------------------

    /// Loads the caller's first project, provisioning a default one when the
    /// caller has none.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error; the snapshot is unchanged.
    pub async fn load(&self) -> Result<Arc<ProjectTree>, ClientError> {
        let mut projects = self.fetch_projects().await?;
        if projects.is_empty() {
            let request = CreateProjectRequest {
                name: DEFAULT_PROJECT_NAME.to_string(),
            };
            let _: ProjectTree = self
                .execute(self.request(Method::POST, "/api/projects").json(&request))
                .await?;
            projects = self.fetch_projects().await?;
        }

        let tree = Arc::new(projects.into_iter().next().ok_or(ClientError::NoProject)?);
        self.snapshot.store(Some(Arc::clone(&tree)));
        tracing::debug!(project_id = %tree.project.id, "Project loaded");
        Ok(tree)
    }

    /// Discards local merges and reloads the whole tree.
    ///
    /// # Errors
    ///
    /// See [`ProjectClient::load`].
    pub async fn refresh(&self) -> Result<Arc<ProjectTree>, ClientError> {
        self.load().await
    }

    async fn fetch_projects(&self) -> Result<Vec<ProjectTree>, ClientError> {
        self.execute(self.request(Method::GET, "/api/projects")).await
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn add_task(&self, request: CreateTaskRequest) -> Result<Task, ClientError> {
        let task: Task = self
            .mutate(
                "add task",
                self.request(Method::POST, "/api/tasks").json(&request),
            )
            .await?;
        self.merge(|tree| tree.with_task(task.clone()));
        Ok(task)
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn update_task(&self, id: TaskId, update: &TaskUpdate) -> Result<Task, ClientError> {
        let body = UpdateTaskRequest::from(update);
        let task: Task = self
            .mutate(
                "update task",
                self.request(Method::PATCH, &format!("/api/tasks/{id}"))
                    .json(&body),
            )
            .await?;
        self.merge(|tree| tree.with_task(task.clone()));
        Ok(task)
    }

    /// Moves a task to another column; nothing else changes.
    ///
    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn move_task(&self, id: TaskId, to: ColumnId) -> Result<Task, ClientError> {
        self.update_task(id, &TaskUpdate::move_to(to)).await
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn delete_task(&self, id: TaskId) -> Result<(), ClientError> {
        let _: SuccessResponse = self
            .mutate(
                "delete task",
                self.request(Method::DELETE, &format!("/api/tasks/{id}")),
            )
            .await?;
        self.merge(|tree| tree.without_task(id));
        Ok(())
    }

    /// # Errors
    ///
    /// Transport or status failures (404 when the task is gone); the snapshot
    /// is unchanged.
    pub async fn duplicate_task(&self, id: TaskId) -> Result<Task, ClientError> {
        let task: Task = self
            .mutate(
                "duplicate task",
                self.request(Method::POST, &format!("/api/tasks/{id}")),
            )
            .await?;
        self.merge(|tree| tree.with_task(task.clone()));
        Ok(task)
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    /// Appends a column to the loaded project.
    ///
    /// # Errors
    ///
    /// `NoProject` before [`ProjectClient::load`], otherwise transport or
    /// status failures.
    pub async fn add_column(&self, title: impl Into<String>) -> Result<Column, ClientError> {
        let request = CreateColumnRequest {
            project_id: self.project_id("add column")?,
            title: title.into(),
        };
        let column: Column = self
            .mutate(
                "add column",
                self.request(Method::POST, "/api/columns").json(&request),
            )
            .await?;
        self.merge(|tree| tree.with_column(column.clone()));
        Ok(column)
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn update_column(
        &self,
        id: ColumnId,
        title: impl Into<String>,
    ) -> Result<Column, ClientError> {
        let request = UpdateColumnRequest {
            title: Some(title.into()),
        };
        let column: Column = self
            .mutate(
                "update column",
                self.request(Method::PATCH, &format!("/api/columns/{id}"))
                    .json(&request),
            )
            .await?;
        self.merge(|tree| tree.with_column(column.clone()));
        Ok(column)
    }

    /// # Errors
    ///
    /// Transport or status failures (409 for the last column); the snapshot
    /// is unchanged.
    pub async fn delete_column(&self, id: ColumnId) -> Result<(), ClientError> {
        let _: SuccessResponse = self
            .mutate(
                "delete column",
                self.request(Method::DELETE, &format!("/api/columns/{id}")),
            )
            .await?;
        self.merge(|tree| tree.without_column(id));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Labels
    // -------------------------------------------------------------------------

    /// Creates a label in the loaded project.
    ///
    /// # Errors
    ///
    /// `NoProject` before [`ProjectClient::load`], otherwise transport or
    /// status failures.
    pub async fn add_label(
        &self,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Result<Label, ClientError> {
        let request = CreateLabelRequest {
            project_id: self.project_id("add label")?,
            name: name.into(),
            color: color.into(),
        };
        let label: Label = self
            .mutate(
                "add label",
                self.request(Method::POST, "/api/labels").json(&request),
            )
            .await?;
        self.merge(|tree| tree.with_label(label.clone()));
        Ok(label)
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn delete_label(&self, id: LabelId) -> Result<(), ClientError> {
        let _: SuccessResponse = self
            .mutate(
                "delete label",
                self.request(Method::DELETE, &format!("/api/labels/{id}")),
            )
            .await?;
        self.merge(|tree| tree.without_label(id));
        Ok(())
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn add_label_to_task(
        &self,
        task_id: TaskId,
        label_id: LabelId,
    ) -> Result<TaskLabel, ClientError> {
        let request = TaskLabelRequest { task_id, label_id };
        let association: TaskLabel = self
            .mutate(
                "add label to task",
                self.request(Method::POST, "/api/task-labels").json(&request),
            )
            .await?;
        self.merge(|tree| tree.with_task_label(association));
        Ok(association)
    }

    /// # Errors
    ///
    /// Transport or status failures; the snapshot is unchanged.
    pub async fn remove_label_from_task(
        &self,
        task_id: TaskId,
        label_id: LabelId,
    ) -> Result<(), ClientError> {
        let request = TaskLabelRequest { task_id, label_id };
        let _: SuccessResponse = self
            .mutate(
                "remove label from task",
                self.request(Method::DELETE, "/api/task-labels")
                    .json(&request),
            )
            .await?;
        self.merge(|tree| tree.without_task_label(TaskLabel::new(task_id, label_id)));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    /// Columns of the current snapshot with their tasks filtered and sorted
    /// by `query`. Empty before the first load.
    pub fn board(&self, query: &BoardQuery) -> Vec<ColumnTree> {
        let Some(tree) = self.snapshot() else {
            return Vec::new();
        };

        query
            .view(&tree.columns)
            .into_iter()
            .map(|(column, tasks)| ColumnTree {
                column: column.column.clone(),
                tasks: tasks.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// Statistics of the current snapshot as of `today`.
    pub fn stats(&self, today: NaiveDate) -> BoardStats {
        self.snapshot()
            .map(|tree| BoardStats::compute(&tree.columns, today))
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Plumbing
    // -------------------------------------------------------------------------

    fn project_id(&self, action: &str) -> Result<ProjectId, ClientError> {
        self.snapshot().map(|tree| tree.project.id).ok_or_else(|| {
            tracing::warn!("Failed to {action}: no project loaded");
            ClientError::NoProject
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
    }

    fn merge(&self, apply: impl Fn(ProjectTree) -> ProjectTree) {
        self.snapshot.rcu(|current| {
            current
                .as_ref()
                .map(|tree| Arc::new(apply(ProjectTree::clone(tree))))
        });
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        action: &str,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let result = self.execute(request).await;
        if let Err(error) = &result {
            tracing::warn!(%error, "Failed to {action}");
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = match response.json::<ApiError>().await {
            Ok(error) => error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };
        Err(ClientError::Status { status, message })
    }
}
