//! Project domain model and the nested project tree.
//!
//! The tree is what clients render: columns sorted by `order`, each holding
//! its tasks sorted by `order`, each task carrying its label associations.
//! All tree operations are pure and return a new tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::column::Column;
use super::ids::{ColumnId, LabelId, ProjectId, TaskId, UserId};
use super::label::{Label, TaskLabel};
use super::task::Task;

/// Name given to the project provisioned on first access.
pub const DEFAULT_PROJECT_NAME: &str = "My Project";

/// Columns every new project starts with, in order.
pub const DEFAULT_COLUMNS: [&str; 3] = ["To Do", "In Progress", "Done"];

/// Labels every new project starts with, as `(name, color)`.
pub const DEFAULT_LABELS: [(&str, &str); 3] = [
    ("Bug", "#ef4444"),
    ("Feature", "#3b82f6"),
    ("Design", "#8b5cf6"),
];

// =============================================================================
// Project
// =============================================================================

/// Top-level container owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(rename = "userId")]
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        owner: UserId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            owner,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

/// A new project together with its default columns and labels.
///
/// Stores persist the whole graph atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSeed {
    pub project: Project,
    pub columns: Vec<Column>,
    pub labels: Vec<Label>,
}

impl ProjectSeed {
    /// Builds a project with the default columns (orders 0, 1, 2) and labels.
    #[must_use]
    pub fn with_defaults(name: impl Into<String>, owner: UserId, timestamp: DateTime<Utc>) -> Self {
        let project = Project::new(ProjectId::generate(), name, owner, timestamp);
        let columns = DEFAULT_COLUMNS
            .iter()
            .zip(0..)
            .map(|(title, order)| Column::new(ColumnId::generate(), project.id, *title, order))
            .collect();
        let labels = DEFAULT_LABELS
            .iter()
            .map(|(name, color)| Label::new(LabelId::generate(), project.id, *name, *color))
            .collect();

        Self {
            project,
            columns,
            labels,
        }
    }

    /// The seed as a tree with empty columns.
    #[must_use]
    pub fn into_tree(self) -> ProjectTree {
        ProjectTree::assemble(self.project, self.columns, Vec::new(), self.labels, &[])
    }
}

// =============================================================================
// Tree
// =============================================================================

/// A label association with the label resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLabelTree {
    pub task_id: TaskId,
    pub label_id: LabelId,
    pub label: Label,
}

/// A task with its labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTree {
    #[serde(flatten)]
    pub task: Task,
    pub labels: Vec<TaskLabelTree>,
}

impl TaskTree {
    /// Returns `true` when the label is attached to this task.
    #[must_use]
    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|entry| entry.label_id == label_id)
    }
}

/// A column with its tasks sorted by `order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTree {
    #[serde(flatten)]
    pub column: Column,
    pub tasks: Vec<TaskTree>,
}

/// A project with its columns and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTree {
    #[serde(flatten)]
    pub project: Project,
    pub columns: Vec<ColumnTree>,
    pub labels: Vec<Label>,
}

impl ProjectTree {
    /// Assembles a tree from flat records.
    ///
    /// Columns and tasks are sorted by `order`, ties broken by id. Tasks
    /// whose column is not among `columns` and associations whose label is
    /// not among `labels` are dropped.
    #[must_use]
    pub fn assemble(
        project: Project,
        mut columns: Vec<Column>,
        mut tasks: Vec<Task>,
        labels: Vec<Label>,
        task_labels: &[TaskLabel],
    ) -> Self {
        columns.sort_by_key(|column| (column.order, column.id));
        tasks.sort_by_key(|task| (task.order, task.id));

        let columns = columns
            .into_iter()
            .map(|column| {
                let tasks = tasks
                    .iter()
                    .filter(|task| task.column_id == column.id)
                    .map(|task| TaskTree {
                        task: task.clone(),
                        labels: resolve_labels(task.id, task_labels, &labels),
                    })
                    .collect();
                ColumnTree { column, tasks }
            })
            .collect();

        Self {
            project,
            columns,
            labels,
        }
    }

    /// Iterates over every task of the project.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskTree> {
        self.columns.iter().flat_map(|column| column.tasks.iter())
    }

    #[must_use]
    pub fn find_task(&self, task_id: TaskId) -> Option<&TaskTree> {
        self.tasks().find(|entry| entry.task.id == task_id)
    }

    #[must_use]
    pub fn find_column(&self, column_id: ColumnId) -> Option<&ColumnTree> {
        self.columns.iter().find(|entry| entry.column.id == column_id)
    }

    /// Inserts or replaces a task.
    ///
    /// A replaced task keeps its labels and moves to its new column when the
    /// column changed. Tasks of the affected column stay sorted by `order`
    /// and id.
    #[must_use]
    pub fn with_task(self, task: Task) -> Self {
        let labels = self
            .find_task(task.id)
            .map(|entry| entry.labels.clone())
            .unwrap_or_default();
        let target = task.column_id;
        let entry = TaskTree { task, labels };

        let mut tree = self.without_task(entry.task.id);
        if let Some(column) = tree.columns.iter_mut().find(|column| column.column.id == target) {
            column.tasks.push(entry);
            column
                .tasks
                .sort_by_key(|existing| (existing.task.order, existing.task.id));
        }
        tree
    }

    #[must_use]
    pub fn without_task(mut self, task_id: TaskId) -> Self {
        for column in &mut self.columns {
            column.tasks.retain(|entry| entry.task.id != task_id);
        }
        self
    }

    /// Inserts or replaces a column, keeping the tasks it already holds.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        match self.columns.iter_mut().find(|entry| entry.column.id == column.id) {
            Some(entry) => entry.column = column,
            None => self.columns.push(ColumnTree {
                column,
                tasks: Vec::new(),
            }),
        }
        self.columns
            .sort_by_key(|entry| (entry.column.order, entry.column.id));
        self
    }

    /// Removes a column together with its tasks.
    #[must_use]
    pub fn without_column(mut self, column_id: ColumnId) -> Self {
        self.columns.retain(|entry| entry.column.id != column_id);
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        match self.labels.iter_mut().find(|existing| existing.id == label.id) {
            Some(existing) => *existing = label,
            None => self.labels.push(label),
        }
        self
    }

    /// Removes a label and every association that references it.
    #[must_use]
    pub fn without_label(mut self, label_id: LabelId) -> Self {
        self.labels.retain(|label| label.id != label_id);
        for task in self.columns.iter_mut().flat_map(|column| column.tasks.iter_mut()) {
            task.labels.retain(|entry| entry.label_id != label_id);
        }
        self
    }

    /// Records an association. Unknown tasks or labels and existing pairs are
    /// ignored.
    #[must_use]
    pub fn with_task_label(mut self, association: TaskLabel) -> Self {
        let Some(label) = self
            .labels
            .iter()
            .find(|label| label.id == association.label_id)
            .cloned()
        else {
            return self;
        };

        if let Some(task) = self
            .columns
            .iter_mut()
            .flat_map(|column| column.tasks.iter_mut())
            .find(|entry| entry.task.id == association.task_id)
        {
            if !task.has_label(association.label_id) {
                task.labels.push(TaskLabelTree {
                    task_id: association.task_id,
                    label_id: association.label_id,
                    label,
                });
            }
        }
        self
    }

    #[must_use]
    pub fn without_task_label(mut self, association: TaskLabel) -> Self {
        if let Some(task) = self
            .columns
            .iter_mut()
            .flat_map(|column| column.tasks.iter_mut())
            .find(|entry| entry.task.id == association.task_id)
        {
            task.labels
                .retain(|entry| entry.label_id != association.label_id);
        }
        self
    }
}

fn resolve_labels(
    task_id: TaskId,
    task_labels: &[TaskLabel],
    labels: &[Label],
) -> Vec<TaskLabelTree> {
    task_labels
        .iter()
        .filter(|association| association.task_id == task_id)
        .filter_map(|association| {
            labels
                .iter()
                .find(|label| label.id == association.label_id)
                .map(|label| TaskLabelTree {
                    task_id,
                    label_id: association.label_id,
                    label: label.clone(),
                })
        })
        .collect()
}
