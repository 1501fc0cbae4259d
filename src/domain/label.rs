//! Labels and their attachment to tasks.

use serde::{Deserialize, Serialize};

use super::ids::{LabelId, ProjectId, TaskId};

/// A named, colored tag belonging to one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: LabelId,
    pub project_id: ProjectId,
    pub name: String,
    /// CSS color, usually hex such as `#ef4444`.
    pub color: String,
}

impl Label {
    #[must_use]
    pub fn new(
        id: LabelId,
        project_id: ProjectId,
        name: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Association between a task and a label. The pair is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLabel {
    pub task_id: TaskId,
    pub label_id: LabelId,
}

impl TaskLabel {
    #[must_use]
    pub const fn new(task_id: TaskId, label_id: LabelId) -> Self {
        Self { task_id, label_id }
    }
}
