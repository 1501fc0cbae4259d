//! Column domain model.

use serde::{Deserialize, Serialize};

use super::ids::{ColumnId, ProjectId};

/// An ordered stage of a project, such as "To Do".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub project_id: ProjectId,
    pub title: String,
    /// Number of sibling columns when this one was created.
    pub order: i32,
}

impl Column {
    #[must_use]
    pub fn new(id: ColumnId, project_id: ProjectId, title: impl Into<String>, order: i32) -> Self {
        Self {
            id,
            project_id,
            title: title.into(),
            order,
        }
    }
}

/// Partial update of a column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnUpdate {
    pub title: Option<String>,
}

impl ColumnUpdate {
    #[must_use]
    pub fn apply(self, column: Column) -> Column {
        Column {
            title: self.title.unwrap_or(column.title),
            ..column
        }
    }
}

/// Converts a sibling count into the `order` of the next sibling.
#[must_use]
pub fn next_order(sibling_count: usize) -> i32 {
    i32::try_from(sibling_count).unwrap_or(i32::MAX)
}
