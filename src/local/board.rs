//! The local-only board.
//!
//! Position in the vectors is the order; there is no `order` field. Every
//! operation consumes the board and returns the next one. Operations naming
//! an unknown column, task or label return the board unchanged.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::domain::{
    COPY_SUFFIX, ColumnView, DEFAULT_LABELS, Priority, TaskView, normalize_description,
    parse_due_date,
};

fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Accepts a calendar date or an RFC 3339 timestamp; timestamps keep their UTC day.
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_due_date(&value)
        .map(|due| due.map(|timestamp| timestamp.date_naive()))
        .map_err(serde::de::Error::custom)
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalLabel {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl LocalLabel {
    #[must_use]
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            name: name.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTask {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_due_date"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub label_ids: Vec<String>,
}

impl LocalTask {
    /// A medium-priority task with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            label_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: normalize_description(Some(description.into())),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: Option<NaiveDate>) -> Self {
        Self { due_date, ..self }
    }

    #[must_use]
    pub fn with_labels<I, S>(self, label_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label_ids: label_ids.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    fn seeded(
        id: &str,
        title: &str,
        description: &str,
        priority: Priority,
        labels: &[&str],
    ) -> Self {
        Self {
            id: id.to_string(),
            ..Self::new(title)
                .with_description(description)
                .with_priority(priority)
                .with_labels(labels.iter().copied())
        }
    }
}

/// Partial edit of a local task. `None` leaves a field untouched; the inner
/// option of the nullable fields clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalTaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub label_ids: Option<Vec<String>>,
}

impl LocalTaskUpdate {
    fn apply(self, task: LocalTask) -> LocalTask {
        LocalTask {
            title: self.title.unwrap_or(task.title),
            description: match self.description {
                Some(description) => normalize_description(description),
                None => task.description,
            },
            priority: self.priority.unwrap_or(task.priority),
            due_date: self.due_date.unwrap_or(task.due_date),
            label_ids: self.label_ids.unwrap_or(task.label_ids),
            ..task
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalColumn {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<LocalTask>,
}

impl LocalColumn {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            tasks: Vec::new(),
        }
    }
}

// =============================================================================
// Board
// =============================================================================

/// Columns and labels of the local-only mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBoard {
    pub columns: Vec<LocalColumn>,
    pub labels: Vec<LocalLabel>,
}

impl Default for LocalBoard {
    /// The board shown on first run.
    fn default() -> Self {
        let labels = DEFAULT_LABELS
            .iter()
            .zip(1..)
            .map(|((name, color), id)| LocalLabel {
                id: id.to_string(),
                name: (*name).to_string(),
                color: (*color).to_string(),
            })
            .collect();

        let column = |id: &str, title: &str, tasks: Vec<LocalTask>| LocalColumn {
            id: id.to_string(),
            title: title.to_string(),
            tasks,
        };
        let columns = vec![
            column(
                "todo",
                "To Do",
                vec![
                    LocalTask::seeded(
                        "1",
                        "Research competitors",
                        "Look at Jira, Linear, Trello",
                        Priority::Medium,
                        &["2"],
                    ),
                    LocalTask::seeded(
                        "2",
                        "Setup project",
                        "Initialize Next.js app",
                        Priority::High,
                        &[],
                    ),
                ],
            ),
            column(
                "inProgress",
                "In Progress",
                vec![LocalTask::seeded(
                    "3",
                    "Build kanban board",
                    "Create columns and cards",
                    Priority::High,
                    &["2"],
                )],
            ),
            column(
                "done",
                "Done",
                vec![LocalTask::seeded(
                    "4",
                    "Create repo",
                    "Setup GitHub repository",
                    Priority::Low,
                    &[],
                )],
            ),
        ];

        Self { columns, labels }
    }
}

impl LocalBoard {
    /// A board without columns or labels.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            columns: Vec::new(),
            labels: Vec::new(),
        }
    }

    #[must_use]
    pub fn find_column(&self, column_id: &str) -> Option<&LocalColumn> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    /// Finds a task anywhere on the board together with its column.
    #[must_use]
    pub fn find_task(&self, task_id: &str) -> Option<(&LocalColumn, &LocalTask)> {
        self.columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .find(|task| task.id == task_id)
                .map(|task| (column, task))
        })
    }

    fn map_column(
        mut self,
        column_id: &str,
        apply: impl FnOnce(&mut LocalColumn),
    ) -> Self {
        if let Some(column) = self.columns.iter_mut().find(|column| column.id == column_id) {
            apply(column);
        }
        self
    }

    fn map_tasks(mut self, mut apply: impl FnMut(&mut LocalTask)) -> Self {
        self.columns
            .iter_mut()
            .flat_map(|column| column.tasks.iter_mut())
            .for_each(&mut apply);
        self
    }

    // -------------------------------------------------------------------------
    // Tasks
    // -------------------------------------------------------------------------

    /// Appends a task to a column.
    #[must_use]
    pub fn add_task(self, column_id: &str, task: LocalTask) -> Self {
        self.map_column(column_id, |column| column.tasks.push(task))
    }

    #[must_use]
    pub fn delete_task(self, column_id: &str, task_id: &str) -> Self {
        self.map_column(column_id, |column| column.tasks.retain(|task| task.id != task_id))
    }

    #[must_use]
    pub fn edit_task(self, column_id: &str, task_id: &str, update: LocalTaskUpdate) -> Self {
        self.map_column(column_id, |column| {
            if let Some(index) = column.tasks.iter().position(|task| task.id == task_id) {
                let task = column.tasks.remove(index);
                column.tasks.insert(index, update.apply(task));
            }
        })
    }

    /// Appends a copy of a task to its column. Unlike the server, the copy
    /// keeps the labels.
    #[must_use]
    pub fn duplicate_task(self, column_id: &str, task_id: &str) -> Self {
        self.map_column(column_id, |column| {
            if let Some(task) = column.tasks.iter().find(|task| task.id == task_id) {
                let copy = LocalTask {
                    id: generate_id(),
                    title: format!("{}{COPY_SUFFIX}", task.title),
                    ..task.clone()
                };
                column.tasks.push(copy);
            }
        })
    }

    /// Moves a task to the end of another column.
    #[must_use]
    pub fn move_task(mut self, task_id: &str, from_column_id: &str, to_column_id: &str) -> Self {
        if from_column_id == to_column_id || self.find_column(to_column_id).is_none() {
            return self;
        }

        let Some(task) = self
            .columns
            .iter_mut()
            .find(|column| column.id == from_column_id)
            .and_then(|column| {
                let index = column.tasks.iter().position(|task| task.id == task_id)?;
                Some(column.tasks.remove(index))
            })
        else {
            return self;
        };

        self.map_column(to_column_id, |column| column.tasks.push(task))
    }

    // -------------------------------------------------------------------------
    // Columns
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn add_column(mut self, title: impl Into<String>) -> Self {
        self.columns.push(LocalColumn::new(title));
        self
    }

    /// Deletes a column with its tasks. The last column is never deleted.
    #[must_use]
    pub fn delete_column(mut self, column_id: &str) -> Self {
        if self.columns.len() <= 1 {
            tracing::debug!(column_id, "Refusing to delete the last column");
            return self;
        }
        self.columns.retain(|column| column.id != column_id);
        self
    }

    #[must_use]
    pub fn edit_column(self, column_id: &str, title: impl Into<String>) -> Self {
        let title = title.into();
        self.map_column(column_id, |column| column.title = title)
    }

    /// Removes the column at `from` and inserts it at `to`.
    ///
    /// Both indices must address an existing column.
    #[must_use]
    pub fn reorder_columns(mut self, from: usize, to: usize) -> Self {
        if from >= self.columns.len() || to >= self.columns.len() {
            return self;
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        self
    }

    // -------------------------------------------------------------------------
    // Labels
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn add_label(mut self, label: LocalLabel) -> Self {
        self.labels.push(label);
        self
    }

    /// Deletes a label and strips it from every task.
    #[must_use]
    pub fn delete_label(mut self, label_id: &str) -> Self {
        self.labels.retain(|label| label.id != label_id);
        self.map_tasks(|task| task.label_ids.retain(|id| id != label_id))
    }

    /// Attaches a known label to a task; attaching twice is a no-op.
    #[must_use]
    pub fn add_label_to_task(self, task_id: &str, label_id: &str) -> Self {
        if !self.labels.iter().any(|label| label.id == label_id) {
            return self;
        }
        self.map_tasks(|task| {
            if task.id == task_id && !task.label_ids.iter().any(|id| id == label_id) {
                task.label_ids.push(label_id.to_string());
            }
        })
    }

    #[must_use]
    pub fn remove_label_from_task(self, task_id: &str, label_id: &str) -> Self {
        self.map_tasks(|task| {
            if task.id == task_id {
                task.label_ids.retain(|id| id != label_id);
            }
        })
    }

    /// Back to the first-run board.
    #[must_use]
    pub fn clear(self) -> Self {
        Self::default()
    }
}

// =============================================================================
// Views
// =============================================================================

impl TaskView for LocalTask {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn due_day(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn has_label_id(&self, label_id: &str) -> bool {
        self.label_ids.iter().any(|id| id == label_id)
    }
}

impl ColumnView for LocalColumn {
    type Task = LocalTask;

    fn title(&self) -> &str {
        &self.title
    }

    fn tasks(&self) -> &[LocalTask] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardQuery, BoardStats, SortOption};
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn board() -> LocalBoard {
        LocalBoard::default()
    }

    fn titles(column: &LocalColumn) -> Vec<&str> {
        column.tasks.iter().map(|task| task.title.as_str()).collect()
    }

    fn column_ids(board: &LocalBoard) -> Vec<&str> {
        board.columns.iter().map(|column| column.id.as_str()).collect()
    }

    #[rstest]
    fn test_default_board(board: LocalBoard) {
        assert_eq!(column_ids(&board), ["todo", "inProgress", "done"]);
        assert_eq!(
            board.labels.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            ["1", "2", "3"]
        );
        let todo = board.find_column("todo").unwrap();
        assert_eq!(titles(todo), ["Research competitors", "Setup project"]);
        assert_eq!(todo.tasks[0].label_ids, ["2"]);
        assert_eq!(board.find_task("4").unwrap().1.priority, Priority::Low);
    }

    #[rstest]
    fn test_add_task_appends(board: LocalBoard) {
        let board = board.add_task("todo", LocalTask::new("X"));
        assert_eq!(titles(board.find_column("todo").unwrap()).last(), Some(&"X"));
    }

    #[rstest]
    fn test_add_task_to_unknown_column_is_noop(board: LocalBoard) {
        let before = board.clone();
        assert_eq!(board.add_task("nope", LocalTask::new("X")), before);
    }

    #[rstest]
    fn test_delete_task(board: LocalBoard) {
        let board = board.delete_task("todo", "1");
        assert_eq!(titles(board.find_column("todo").unwrap()), ["Setup project"]);
    }

    #[rstest]
    fn test_edit_task_keeps_position(board: LocalBoard) {
        let update = LocalTaskUpdate {
            title: Some("Research rivals".to_string()),
            description: Some(Some(String::new())),
            ..LocalTaskUpdate::default()
        };

        let board = board.edit_task("todo", "1", update);

        let todo = board.find_column("todo").unwrap();
        assert_eq!(titles(todo), ["Research rivals", "Setup project"]);
        assert!(todo.tasks[0].description.is_none());
        assert_eq!(todo.tasks[0].priority, Priority::Medium);
    }

    #[rstest]
    fn test_duplicate_task_copies_labels(board: LocalBoard) {
        let board = board.duplicate_task("todo", "1");

        let todo = board.find_column("todo").unwrap();
        let copy = todo.tasks.last().unwrap();
        assert_eq!(copy.title, "Research competitors (copy)");
        assert_ne!(copy.id, "1");
        assert_eq!(copy.label_ids, ["2"]);
        assert_eq!(copy.description.as_deref(), Some("Look at Jira, Linear, Trello"));
    }

    #[rstest]
    fn test_move_task_appends_to_target(board: LocalBoard) {
        let board = board.move_task("2", "todo", "done");

        assert_eq!(titles(board.find_column("todo").unwrap()), ["Research competitors"]);
        assert_eq!(
            titles(board.find_column("done").unwrap()),
            ["Create repo", "Setup project"]
        );
    }

    #[rstest]
    #[case("2", "todo", "todo")]
    #[case("2", "todo", "nope")]
    #[case("2", "done", "todo")]
    #[case("99", "todo", "done")]
    fn test_move_task_noop_cases(
        board: LocalBoard,
        #[case] task: &str,
        #[case] from: &str,
        #[case] to: &str,
    ) {
        let before = board.clone();
        assert_eq!(board.move_task(task, from, to), before);
    }

    #[rstest]
    fn test_add_and_edit_column(board: LocalBoard) {
        let board = board.add_column("Review");
        let id = board.columns.last().unwrap().id.clone();

        let board = board.edit_column(&id, "QA");

        assert_eq!(board.find_column(&id).unwrap().title, "QA");
        assert_eq!(board.columns.len(), 4);
    }

    #[rstest]
    fn test_delete_column_drops_tasks(board: LocalBoard) {
        let board = board.delete_column("todo");
        assert_eq!(column_ids(&board), ["inProgress", "done"]);
        assert!(board.find_task("1").is_none());
    }

    #[rstest]
    fn test_last_column_is_kept(board: LocalBoard) {
        let board = board.delete_column("todo").delete_column("inProgress");
        let board = board.delete_column("done");
        assert_eq!(column_ids(&board), ["done"]);
    }

    #[rstest]
    #[case(0, 2, ["inProgress", "done", "todo"])]
    #[case(2, 0, ["done", "todo", "inProgress"])]
    #[case(1, 1, ["todo", "inProgress", "done"])]
    #[case(0, 3, ["todo", "inProgress", "done"])]
    #[case(5, 0, ["todo", "inProgress", "done"])]
    fn test_reorder_columns(
        board: LocalBoard,
        #[case] from: usize,
        #[case] to: usize,
        #[case] expected: [&str; 3],
    ) {
        let board = board.reorder_columns(from, to);
        assert_eq!(column_ids(&board), expected);
    }

    #[rstest]
    fn test_delete_label_strips_tasks(board: LocalBoard) {
        let board = board.delete_label("2");

        assert_eq!(board.labels.len(), 2);
        assert!(board.find_task("1").unwrap().1.label_ids.is_empty());
        assert!(board.find_task("3").unwrap().1.label_ids.is_empty());
    }

    #[rstest]
    fn test_label_attach_and_detach(board: LocalBoard) {
        let board = board
            .add_label_to_task("2", "1")
            .add_label_to_task("2", "1")
            .add_label_to_task("2", "missing");
        assert_eq!(board.find_task("2").unwrap().1.label_ids, ["1"]);

        let board = board.remove_label_from_task("2", "1");
        assert!(board.find_task("2").unwrap().1.label_ids.is_empty());
    }

    #[rstest]
    fn test_add_label(board: LocalBoard) {
        let board = board.add_label(LocalLabel::new("Docs", "#22c55e"));
        assert_eq!(board.labels.last().unwrap().name, "Docs");
    }

    #[rstest]
    fn test_clear_restores_defaults(board: LocalBoard) {
        let board = board.delete_column("todo").clear();
        assert_eq!(board, LocalBoard::default());
    }

    #[rstest]
    fn test_board_views_work_on_local_columns(board: LocalBoard) {
        let query = BoardQuery {
            label: Some("2".to_string()),
            sort: SortOption::Title,
            ..BoardQuery::default()
        };
        assert_eq!(query.visible_count(&board.columns), 2);

        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let stats = BoardStats::compute(&board.columns, today);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.completion_rate, 25);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.high_priority, 2);
    }

    #[rstest]
    fn test_task_serializes_with_camel_case() {
        let task = LocalTask::new("X")
            .with_due_date(NaiveDate::from_ymd_opt(2025, 2, 3))
            .with_labels(["1"]);

        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["dueDate"], "2025-02-03");
        assert_eq!(json["labelIds"][0], "1");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("description").is_none());
    }

    #[rstest]
    #[case(r#""2025-02-03""#, Some((2025, 2, 3)))]
    #[case(r#""2025-02-03T18:30:00.000Z""#, Some((2025, 2, 3)))]
    #[case(r#""2025-02-03T23:30:00-05:00""#, Some((2025, 2, 4)))]
    #[case(r#""""#, None)]
    #[case("null", None)]
    fn test_task_due_date_accepts_dates_and_timestamps(
        #[case] due_date: &str,
        #[case] expected: Option<(i32, u32, u32)>,
    ) {
        let json = format!(r#"{{"id": "t", "title": "T", "dueDate": {due_date}}}"#);

        let task: LocalTask = serde_json::from_str(&json).unwrap();

        let expected = expected.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d));
        assert_eq!(task.due_date, expected);
    }

    #[rstest]
    fn test_task_due_date_rejects_garbage() {
        let json = r#"{"id": "t", "title": "T", "dueDate": "soon"}"#;
        assert!(serde_json::from_str::<LocalTask>(json).is_err());
    }

    proptest! {
        #[test]
        fn prop_reorder_is_a_splice(len in 1usize..8, from in 0usize..10, to in 0usize..10) {
            let mut board = LocalBoard::empty();
            for index in 0..len {
                board = board.add_column(index.to_string());
            }
            let before: Vec<String> = board.columns.iter().map(|c| c.id.clone()).collect();

            let after: Vec<String> = board
                .reorder_columns(from, to)
                .columns
                .iter()
                .map(|c| c.id.clone())
                .collect();

            if from < len && to < len {
                let mut expected = before.clone();
                let moved = expected.remove(from);
                expected.insert(to, moved);
                prop_assert_eq!(&after[to], &before[from]);
                prop_assert_eq!(after, expected);
            } else {
                prop_assert_eq!(after, before);
            }
        }
    }
}
