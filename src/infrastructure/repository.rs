//! Repository traits for board entities.
//!
//! Every method returns a boxed `'static` future so implementations can be
//! shared as `Arc<dyn Trait + Send + Sync>` and selected at runtime.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{
    Column, ColumnId, ColumnUpdate, Label, LabelId, ProjectSeed, ProjectTree, Task, TaskId,
    TaskLabel, TaskUpdate, UserId,
};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// A referenced entity does not exist.
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    /// The write would break a board invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Future returned by repository methods.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Traits
// =============================================================================

/// Repository for projects and the trees hanging off them.
pub trait ProjectRepository: Send + Sync {
    /// Loads every project owned by `owner` with columns, tasks and labels.
    fn list_trees(&self, owner: UserId) -> RepositoryFuture<Vec<ProjectTree>>;

    /// Persists a project with its default columns and labels in one step.
    fn create_with_defaults(&self, seed: ProjectSeed) -> RepositoryFuture<ProjectTree>;
}

/// Repository for columns.
pub trait ColumnRepository: Send + Sync {
    /// Appends a column to its project.
    ///
    /// The `order` of `column` is replaced by the number of columns the
    /// project already has.
    fn append(&self, column: Column) -> RepositoryFuture<Column>;

    fn update(&self, id: ColumnId, update: ColumnUpdate) -> RepositoryFuture<Column>;

    /// Deletes a column and, transitively, its tasks and their labels.
    ///
    /// # Errors
    ///
    /// Fails with `InvariantViolation` when the column is the last one of its
    /// project.
    fn delete(&self, id: ColumnId) -> RepositoryFuture<()>;
}

/// Repository for tasks.
pub trait TaskRepository: Send + Sync {
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>>;

    /// Appends a task to its column.
    ///
    /// The `order` of `task` is replaced by the number of tasks the column
    /// already has.
    fn append(&self, task: Task) -> RepositoryFuture<Task>;

    fn update(
        &self,
        id: TaskId,
        update: TaskUpdate,
        timestamp: DateTime<Utc>,
    ) -> RepositoryFuture<Task>;

    /// Deletes a task and its label associations.
    fn delete(&self, id: TaskId) -> RepositoryFuture<()>;
}

/// Repository for labels and task/label associations.
pub trait LabelRepository: Send + Sync {
    fn insert(&self, label: Label) -> RepositoryFuture<Label>;

    /// Deletes a label and every association that references it.
    fn delete(&self, id: LabelId) -> RepositoryFuture<()>;

    /// Attaches a label to a task.
    ///
    /// # Errors
    ///
    /// Fails with `AlreadyExists` when the pair is already attached and with
    /// `InvariantViolation` when the label belongs to another project.
    fn attach(&self, association: TaskLabel) -> RepositoryFuture<TaskLabel>;

    /// Detaches a label from a task; fails with `NotFound` if not attached.
    fn detach(&self, association: TaskLabel) -> RepositoryFuture<()>;
}
