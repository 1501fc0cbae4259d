//! Domain module for the kanban board.
//!
//! This module contains the entities (projects, columns, tasks, labels), the
//! nested project tree clients render, and the read-only board views.

pub mod board;
pub mod column;
pub mod ids;
pub mod label;
pub mod project;
pub mod task;

pub use board::{BoardQuery, BoardStats, ColumnView, SortOption, TaskView};
pub use column::{Column, ColumnUpdate, next_order};
pub use ids::{ColumnId, LabelId, ProjectId, TaskId, UserId};
pub use label::{Label, TaskLabel};
pub use project::{
    ColumnTree, DEFAULT_COLUMNS, DEFAULT_LABELS, DEFAULT_PROJECT_NAME, Project, ProjectSeed,
    ProjectTree, TaskLabelTree, TaskTree,
};
pub use task::{
    COPY_SUFFIX, InvalidDueDate, InvalidPriority, Priority, Task, TaskUpdate,
    normalize_description, parse_due_date,
};
