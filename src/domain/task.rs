//! Task domain model.
//!
//! A task lives in exactly one column and carries an `order` that positions it
//! among its siblings. The column can be reassigned; the `order` is not
//! renumbered when that happens.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ids::{ColumnId, TaskId};

/// Suffix appended to the title of a duplicated task.
pub const COPY_SUFFIX: &str = " (copy)";

// =============================================================================
// Priority
// =============================================================================

/// The priority level of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    /// Default for new tasks.
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Position when sorting by priority; high comes first.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Returns the wire and database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when a priority string is not `low`, `medium` or `high`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid priority: '{0}'. Expected 'low', 'medium' or 'high'")]
pub struct InvalidPriority(pub String);

impl std::str::FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(InvalidPriority(other.to_string())),
        }
    }
}

// =============================================================================
// Due dates
// =============================================================================

/// Error returned when a due date is neither RFC 3339 nor `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid due date: '{0}'")]
pub struct InvalidDueDate(pub String);

/// Parses a due date as sent by clients.
///
/// An empty string means "no due date". Plain calendar dates resolve to
/// midnight UTC.
///
/// # Errors
///
/// Returns [`InvalidDueDate`] when the input is not a recognised date format.
pub fn parse_due_date(value: &str) -> Result<Option<DateTime<Utc>>, InvalidDueDate> {
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| Some(date.and_time(NaiveTime::MIN).and_utc()))
        .map_err(|_| InvalidDueDate(value.to_string()))
}

/// Empty descriptions are stored as absent.
#[must_use]
pub fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|text| !text.is_empty())
}

// =============================================================================
// Task
// =============================================================================

/// A unit of work on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    /// Position among the tasks of the column at creation time.
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task with medium priority, no description and no due date.
    #[must_use]
    pub fn new(
        id: TaskId,
        column_id: ColumnId,
        title: impl Into<String>,
        order: i32,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            column_id,
            title: title.into(),
            description: None,
            priority: Priority::default(),
            due_date: None,
            order,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns a new task with the given description (empty clears it).
    #[must_use]
    pub fn with_description(self, description: Option<String>) -> Self {
        Self {
            description: normalize_description(description),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self { priority, ..self }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: Option<DateTime<Utc>>) -> Self {
        Self { due_date, ..self }
    }

    /// Builds the copy created by the duplicate operation.
    ///
    /// The copy stays in the same column, keeps description, priority and due
    /// date, and is placed at `order`. Labels are never part of a `Task`, so
    /// they are not carried over.
    #[must_use]
    pub fn duplicate(&self, id: TaskId, order: i32, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            column_id: self.column_id,
            title: format!("{}{COPY_SUFFIX}", self.title),
            description: self.description.clone(),
            priority: self.priority,
            due_date: self.due_date,
            order,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }
}

// =============================================================================
// Partial update
// =============================================================================

/// Partial update of a task.
///
/// `None` leaves a field untouched. For the nullable fields the inner option
/// carries the new value, where `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub column_id: Option<ColumnId>,
}

impl TaskUpdate {
    /// An update that only reassigns the column.
    #[must_use]
    pub fn move_to(column_id: ColumnId) -> Self {
        Self {
            column_id: Some(column_id),
            ..Self::default()
        }
    }

    /// Returns `true` when no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.column_id.is_none()
    }

    /// Applies the present fields to `task`.
    #[must_use]
    pub fn apply(self, task: Task, timestamp: DateTime<Utc>) -> Task {
        Task {
            title: self.title.unwrap_or(task.title),
            description: match self.description {
                Some(description) => normalize_description(description),
                None => task.description,
            },
            priority: self.priority.unwrap_or(task.priority),
            due_date: self.due_date.unwrap_or(task.due_date),
            column_id: self.column_id.unwrap_or(task.column_id),
            updated_at: timestamp,
            ..task
        }
    }
}
