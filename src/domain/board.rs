//! Read-only board views: filtering, sorting and statistics.
//!
//! Both the server-backed project tree and the local-only board expose their
//! tasks through [`TaskView`] and their columns through [`ColumnView`], so the
//! same view logic serves both.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::project::{ColumnTree, TaskTree};
use super::task::Priority;

// =============================================================================
// View traits
// =============================================================================

/// Read access to the task fields the board filters and sorts on.
pub trait TaskView {
    fn title(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn priority(&self) -> Priority;
    /// Due date truncated to the calendar day.
    fn due_day(&self) -> Option<NaiveDate>;
    /// Returns `true` when the label with this textual id is attached.
    fn has_label_id(&self, label_id: &str) -> bool;
}

/// Read access to a column and its tasks.
pub trait ColumnView {
    type Task: TaskView;

    fn title(&self) -> &str;
    fn tasks(&self) -> &[Self::Task];
}

impl TaskView for TaskTree {
    fn title(&self) -> &str {
        &self.task.title
    }

    fn description(&self) -> Option<&str> {
        self.task.description.as_deref()
    }

    fn priority(&self) -> Priority {
        self.task.priority
    }

    fn due_day(&self) -> Option<NaiveDate> {
        self.task.due_date.map(|due| due.date_naive())
    }

    fn has_label_id(&self, label_id: &str) -> bool {
        self.labels
            .iter()
            .any(|entry| entry.label_id.to_string() == label_id)
    }
}

impl ColumnView for ColumnTree {
    type Task = TaskTree;

    fn title(&self) -> &str {
        &self.column.title
    }

    fn tasks(&self) -> &[TaskTree] {
        &self.tasks
    }
}

// =============================================================================
// Filtering and sorting
// =============================================================================

/// How tasks inside a column are ordered for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOption {
    /// Keep the stored order.
    #[default]
    None,
    Priority,
    DueDate,
    Title,
}

/// Display filter over the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    /// Case-insensitive substring matched against title or description.
    pub search: String,
    pub priority: Option<Priority>,
    pub label: Option<String>,
    pub sort: SortOption,
}

impl BoardQuery {
    /// Returns `true` when `task` passes every filter.
    pub fn matches<T: TaskView>(&self, task: &T) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = task.title().to_lowercase().contains(&needle)
            || task
                .description()
                .is_some_and(|description| description.to_lowercase().contains(&needle));
        let matches_priority = self.priority.is_none_or(|priority| task.priority() == priority);
        let matches_label = self
            .label
            .as_deref()
            .is_none_or(|label| task.has_label_id(label));

        matches_search && matches_priority && matches_label
    }

    /// Filters then sorts the tasks of one column.
    pub fn apply<'a, T: TaskView>(&self, tasks: &'a [T]) -> Vec<&'a T> {
        let mut visible: Vec<&T> = tasks.iter().filter(|task| self.matches(*task)).collect();

        match self.sort {
            SortOption::None => {}
            SortOption::Priority => visible.sort_by_key(|task| task.priority().rank()),
            SortOption::DueDate => {
                visible.sort_by(|left, right| compare_due(left.due_day(), right.due_day()));
            }
            SortOption::Title => visible.sort_by(|left, right| left.title().cmp(right.title())),
        }

        visible
    }

    /// Applies the query to every column, returning `(column, visible tasks)`.
    pub fn view<'a, C: ColumnView>(&self, columns: &'a [C]) -> Vec<(&'a C, Vec<&'a C::Task>)> {
        columns
            .iter()
            .map(|column| (column, self.apply(column.tasks())))
            .collect()
    }

    /// Number of tasks visible across all columns.
    pub fn visible_count<C: ColumnView>(&self, columns: &[C]) -> usize {
        columns
            .iter()
            .map(|column| column.tasks().iter().filter(|task| self.matches(*task)).count())
            .sum()
    }
}

/// Undated tasks sort after dated ones.
fn compare_due(left: Option<NaiveDate>, right: Option<NaiveDate>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Summary numbers shown above the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    /// Percentage of tasks in the done column, rounded.
    pub completion_rate: u32,
    pub in_progress: usize,
    /// High-priority tasks that are not done.
    pub high_priority: usize,
    /// Tasks that are not done and were due before `today`.
    pub overdue: usize,
    /// Tasks that are not done and are due `today`.
    pub due_today: usize,
}

fn is_done_title(title: &str) -> bool {
    matches!(title.to_lowercase().as_str(), "done" | "completed")
}

fn is_in_progress_title(title: &str) -> bool {
    matches!(title.to_lowercase().as_str(), "in progress" | "doing")
}

impl BoardStats {
    /// Computes the statistics of a board as of `today`.
    pub fn compute<C: ColumnView>(columns: &[C], today: NaiveDate) -> Self {
        let total = columns.iter().map(|column| column.tasks().len()).sum();
        let completed = columns
            .iter()
            .find(|column| is_done_title(column.title()))
            .map_or(0, |column| column.tasks().len());
        let in_progress = columns
            .iter()
            .find(|column| is_in_progress_title(column.title()))
            .map_or(0, |column| column.tasks().len());

        let incomplete: Vec<&C::Task> = columns
            .iter()
            .filter(|column| !is_done_title(column.title()))
            .flat_map(|column| column.tasks().iter())
            .collect();

        let high_priority = incomplete
            .iter()
            .filter(|task| task.priority() == Priority::High)
            .count();
        let overdue = incomplete
            .iter()
            .filter(|task| task.due_day().is_some_and(|due| due < today))
            .count();
        let due_today = incomplete
            .iter()
            .filter(|task| task.due_day() == Some(today))
            .count();

        Self {
            total,
            completed,
            completion_rate: completion_rate(completed, total),
            in_progress,
            high_priority,
            overdue,
            due_today,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn completion_rate(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u32
}
