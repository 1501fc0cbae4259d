//! In-memory board store.
//!
//! A single set of tables behind one `RwLock` implements every repository
//! trait, so cascades and the count-then-insert of `order` happen under one
//! write guard. Ordered maps keep listing deterministic: identifiers are
//! time-ordered, so ties on `order` resolve by creation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{
    Column, ColumnId, ColumnUpdate, Label, LabelId, Project, ProjectId, ProjectSeed, ProjectTree,
    Task, TaskId, TaskLabel, TaskUpdate, UserId, next_order,
};
use crate::infrastructure::{
    ColumnRepository, LabelRepository, ProjectRepository, RepositoryError, RepositoryFuture,
    TaskRepository,
};

#[derive(Debug, Default)]
struct BoardTables {
    projects: BTreeMap<ProjectId, Project>,
    columns: BTreeMap<ColumnId, Column>,
    tasks: BTreeMap<TaskId, Task>,
    labels: BTreeMap<LabelId, Label>,
    task_labels: BTreeSet<(TaskId, LabelId)>,
}

impl BoardTables {
    fn tree(&self, project: &Project) -> ProjectTree {
        let columns: Vec<Column> = self
            .columns
            .values()
            .filter(|column| column.project_id == project.id)
            .cloned()
            .collect();
        let tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|task| columns.iter().any(|column| column.id == task.column_id))
            .cloned()
            .collect();
        let labels: Vec<Label> = self
            .labels
            .values()
            .filter(|label| label.project_id == project.id)
            .cloned()
            .collect();
        let associations: Vec<TaskLabel> = self
            .task_labels
            .iter()
            .map(|(task_id, label_id)| TaskLabel::new(*task_id, *label_id))
            .collect();

        ProjectTree::assemble(project.clone(), columns, tasks, labels, &associations)
    }

    fn remove_task(&mut self, id: TaskId) {
        self.tasks.remove(&id);
        self.task_labels.retain(|(task_id, _)| *task_id != id);
    }

    fn project_of_task(&self, task: &Task) -> Option<ProjectId> {
        self.columns.get(&task.column_id).map(|column| column.project_id)
    }
}

/// Thread-safe in-memory implementation of all board repositories.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    tables: Arc<RwLock<BoardTables>>,
}

impl InMemoryBoardStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl ProjectRepository for InMemoryBoardStore {
    fn list_trees(&self, owner: UserId) -> RepositoryFuture<Vec<ProjectTree>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let guard = tables.read().await;
            let mut projects: Vec<&Project> = guard
                .projects
                .values()
                .filter(|project| project.owner == owner)
                .collect();
            projects.sort_by_key(|project| project.created_at);
            Ok(projects.into_iter().map(|project| guard.tree(project)).collect())
        })
    }

    fn create_with_defaults(&self, seed: ProjectSeed) -> RepositoryFuture<ProjectTree> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.projects.contains_key(&seed.project.id) {
                return Err(RepositoryError::AlreadyExists(format!(
                    "project {}",
                    seed.project.id
                )));
            }

            guard.projects.insert(seed.project.id, seed.project.clone());
            for column in &seed.columns {
                guard.columns.insert(column.id, column.clone());
            }
            for label in &seed.labels {
                guard.labels.insert(label.id, label.clone());
            }
            Ok(seed.into_tree())
        })
    }
}

#[allow(clippy::significant_drop_tightening)]
impl ColumnRepository for InMemoryBoardStore {
    fn append(&self, column: Column) -> RepositoryFuture<Column> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.projects.contains_key(&column.project_id) {
                return Err(RepositoryError::NotFound(format!(
                    "project {}",
                    column.project_id
                )));
            }

            let siblings = guard
                .columns
                .values()
                .filter(|existing| existing.project_id == column.project_id)
                .count();
            let column = Column {
                order: next_order(siblings),
                ..column
            };
            guard.columns.insert(column.id, column.clone());
            Ok(column)
        })
    }

    fn update(&self, id: ColumnId, update: ColumnUpdate) -> RepositoryFuture<Column> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            let existing = guard
                .columns
                .remove(&id)
                .ok_or_else(|| RepositoryError::NotFound(format!("column {id}")))?;
            let column = update.apply(existing);
            guard.columns.insert(id, column.clone());
            Ok(column)
        })
    }

    fn delete(&self, id: ColumnId) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            let project_id = guard
                .columns
                .get(&id)
                .map(|column| column.project_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("column {id}")))?;

            let siblings = guard
                .columns
                .values()
                .filter(|column| column.project_id == project_id)
                .count();
            if siblings <= 1 {
                return Err(RepositoryError::InvariantViolation(format!(
                    "column {id} is the last column of project {project_id}"
                )));
            }

            let doomed: Vec<TaskId> = guard
                .tasks
                .values()
                .filter(|task| task.column_id == id)
                .map(|task| task.id)
                .collect();
            for task_id in doomed {
                guard.remove_task(task_id);
            }
            guard.columns.remove(&id);
            Ok(())
        })
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryBoardStore {
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(guard.tasks.get(&id).cloned())
        })
    }

    fn append(&self, task: Task) -> RepositoryFuture<Task> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.columns.contains_key(&task.column_id) {
                return Err(RepositoryError::NotFound(format!(
                    "column {}",
                    task.column_id
                )));
            }

            let siblings = guard
                .tasks
                .values()
                .filter(|existing| existing.column_id == task.column_id)
                .count();
            let task = Task {
                order: next_order(siblings),
                ..task
            };
            guard.tasks.insert(task.id, task.clone());
            Ok(task)
        })
    }

    fn update(
        &self,
        id: TaskId,
        update: TaskUpdate,
        timestamp: DateTime<Utc>,
    ) -> RepositoryFuture<Task> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if let Some(column_id) = update.column_id {
                if !guard.columns.contains_key(&column_id) {
                    return Err(RepositoryError::NotFound(format!("column {column_id}")));
                }
            }

            let existing = guard
                .tasks
                .remove(&id)
                .ok_or_else(|| RepositoryError::NotFound(format!("task {id}")))?;
            let task = update.apply(existing, timestamp);
            guard.tasks.insert(id, task.clone());
            Ok(task)
        })
    }

    fn delete(&self, id: TaskId) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.tasks.contains_key(&id) {
                return Err(RepositoryError::NotFound(format!("task {id}")));
            }
            guard.remove_task(id);
            Ok(())
        })
    }
}

#[allow(clippy::significant_drop_tightening)]
impl LabelRepository for InMemoryBoardStore {
    fn insert(&self, label: Label) -> RepositoryFuture<Label> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if !guard.projects.contains_key(&label.project_id) {
                return Err(RepositoryError::NotFound(format!(
                    "project {}",
                    label.project_id
                )));
            }
            guard.labels.insert(label.id, label.clone());
            Ok(label)
        })
    }

    fn delete(&self, id: LabelId) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            if guard.labels.remove(&id).is_none() {
                return Err(RepositoryError::NotFound(format!("label {id}")));
            }
            guard.task_labels.retain(|(_, label_id)| *label_id != id);
            Ok(())
        })
    }

    fn attach(&self, association: TaskLabel) -> RepositoryFuture<TaskLabel> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            let TaskLabel { task_id, label_id } = association;

            let task = guard
                .tasks
                .get(&task_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("task {task_id}")))?;
            let label = guard
                .labels
                .get(&label_id)
                .ok_or_else(|| RepositoryError::NotFound(format!("label {label_id}")))?;
            if guard.project_of_task(task) != Some(label.project_id) {
                return Err(RepositoryError::InvariantViolation(format!(
                    "label {label_id} belongs to another project than task {task_id}"
                )));
            }

            if !guard.task_labels.insert((task_id, label_id)) {
                return Err(RepositoryError::AlreadyExists(format!(
                    "label {label_id} on task {task_id}"
                )));
            }
            Ok(association)
        })
    }

    fn detach(&self, association: TaskLabel) -> RepositoryFuture<()> {
        let tables = Arc::clone(&self.tables);
        Box::pin(async move {
            let mut guard = tables.write().await;
            let TaskLabel { task_id, label_id } = association;
            if guard.task_labels.remove(&(task_id, label_id)) {
                Ok(())
            } else {
                Err(RepositoryError::NotFound(format!(
                    "label {label_id} on task {task_id}"
                )))
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
