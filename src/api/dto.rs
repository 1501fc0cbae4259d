//! Request and response bodies.
//!
//! Entities are returned as-is; their serde shapes are the wire format. The
//! request types double as the client's request bodies, so they serialize
//! too and skip absent fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::{
    ColumnId, ColumnUpdate, InvalidDueDate, InvalidPriority, LabelId, Priority, ProjectId, TaskId,
    TaskUpdate, parse_due_date,
};

/// A field that was sent but could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidField {
    #[error(transparent)]
    Priority(#[from] InvalidPriority),
    #[error(transparent)]
    DueDate(#[from] InvalidDueDate),
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn parse_priority(priority: Option<&str>) -> Result<Priority, InvalidPriority> {
    match priority {
        None | Some("") => Ok(Priority::default()),
        Some(value) => value.parse(),
    }
}

fn format_due_date(due_date: DateTime<Utc>) -> String {
    due_date.to_rfc3339()
}

// =============================================================================
// Projects and columns
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnRequest {
    pub project_id: ProjectId,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateColumnRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl From<UpdateColumnRequest> for ColumnUpdate {
    fn from(request: UpdateColumnRequest) -> Self {
        Self {
            title: request.title,
        }
    }
}

// =============================================================================
// Tasks
// =============================================================================

/// Body of `POST /api/tasks`.
///
/// `priority` defaults to medium when absent or empty; an empty
/// `description` or `dueDate` means none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub column_id: ColumnId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl CreateTaskRequest {
    #[must_use]
    pub fn new(column_id: ColumnId, title: impl Into<String>) -> Self {
        Self {
            column_id,
            title: title.into(),
            description: None,
            priority: None,
            due_date: None,
        }
    }

    #[must_use]
    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: Priority) -> Self {
        Self {
            priority: Some(priority.as_str().to_string()),
            ..self
        }
    }

    #[must_use]
    pub fn with_due_date(self, due_date: DateTime<Utc>) -> Self {
        Self {
            due_date: Some(format_due_date(due_date)),
            ..self
        }
    }

    /// # Errors
    ///
    /// Fails when `priority` or `dueDate` cannot be parsed.
    pub fn priority(&self) -> Result<Priority, InvalidField> {
        Ok(parse_priority(self.priority.as_deref())?)
    }

    /// # Errors
    ///
    /// Fails when `dueDate` is neither RFC 3339 nor `YYYY-MM-DD`.
    pub fn due_date(&self) -> Result<Option<DateTime<Utc>>, InvalidField> {
        match self.due_date.as_deref() {
            None => Ok(None),
            Some(value) => Ok(parse_due_date(value)?),
        }
    }
}

/// Body of `PATCH /api/tasks/:id`.
///
/// Absent fields are left untouched. `null` or `""` clears `description` and
/// `dueDate`; `null` on the other fields counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<ColumnId>,
}

impl UpdateTaskRequest {
    /// # Errors
    ///
    /// Fails when `priority` or `dueDate` cannot be parsed.
    pub fn into_update(self) -> Result<TaskUpdate, InvalidField> {
        let priority = self
            .priority
            .map(|value| value.parse::<Priority>())
            .transpose()?;
        let due_date = match self.due_date {
            None => None,
            Some(None) => Some(None),
            Some(Some(value)) => Some(parse_due_date(&value)?),
        };

        Ok(TaskUpdate {
            title: self.title,
            description: self.description,
            priority,
            due_date,
            column_id: self.column_id,
        })
    }
}

impl From<&TaskUpdate> for UpdateTaskRequest {
    fn from(update: &TaskUpdate) -> Self {
        Self {
            title: update.title.clone(),
            description: update.description.clone(),
            priority: update.priority.map(|priority| priority.as_str().to_string()),
            due_date: update
                .due_date
                .map(|due_date| due_date.map(format_due_date)),
            column_id: update.column_id,
        }
    }
}

// =============================================================================
// Labels
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    pub project_id: ProjectId,
    pub name: String,
    pub color: String,
}

/// Body of both `POST` and `DELETE /api/task-labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLabelRequest {
    pub task_id: TaskId,
    pub label_id: LabelId,
}

// =============================================================================
// Responses
// =============================================================================

/// Body returned by delete operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub const OK: Self = Self { success: true };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({}), Priority::Medium)]
    #[case(json!({"priority": ""}), Priority::Medium)]
    #[case(json!({"priority": "high"}), Priority::High)]
    fn test_create_task_priority_defaults_to_medium(
        #[case] extra: serde_json::Value,
        #[case] expected: Priority,
    ) {
        let mut body = json!({"columnId": ColumnId::generate(), "title": "X"});
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }

        let request: CreateTaskRequest = serde_json::from_value(body).unwrap();

        assert_eq!(request.priority().unwrap(), expected);
    }

    #[rstest]
    fn test_create_task_rejects_unknown_priority() {
        let request = CreateTaskRequest {
            priority: Some("urgent".to_string()),
            ..CreateTaskRequest::new(ColumnId::generate(), "X")
        };
        assert!(matches!(request.priority(), Err(InvalidField::Priority(_))));
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("2025-06-01"), Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()))]
    fn test_create_task_due_date(
        #[case] input: Option<&str>,
        #[case] expected: Option<DateTime<Utc>>,
    ) {
        let request = CreateTaskRequest {
            due_date: input.map(str::to_string),
            ..CreateTaskRequest::new(ColumnId::generate(), "X")
        };
        assert_eq!(request.due_date().unwrap(), expected);
    }

    #[rstest]
    fn test_update_distinguishes_absent_from_null() {
        let absent: UpdateTaskRequest = serde_json::from_value(json!({"title": "T"})).unwrap();
        let cleared: UpdateTaskRequest =
            serde_json::from_value(json!({"description": null, "dueDate": null})).unwrap();

        let absent = absent.into_update().unwrap();
        let cleared = cleared.into_update().unwrap();

        assert_eq!(absent.title.as_deref(), Some("T"));
        assert_eq!(absent.description, None);
        assert_eq!(absent.due_date, None);
        assert_eq!(cleared.description, Some(None));
        assert_eq!(cleared.due_date, Some(None));
    }

    #[rstest]
    fn test_update_empty_due_date_clears() {
        let request: UpdateTaskRequest = serde_json::from_value(json!({"dueDate": ""})).unwrap();
        assert_eq!(request.into_update().unwrap().due_date, Some(None));
    }

    #[rstest]
    fn test_update_null_title_is_absent() {
        let request: UpdateTaskRequest =
            serde_json::from_value(json!({"title": null, "columnId": null})).unwrap();
        assert!(request.into_update().unwrap().is_empty());
    }

    #[rstest]
    fn test_update_request_from_task_update_serializes_only_present_fields() {
        let column_id = ColumnId::generate();
        let update = TaskUpdate {
            description: Some(None),
            ..TaskUpdate::move_to(column_id)
        };

        let json = serde_json::to_value(UpdateTaskRequest::from(&update)).unwrap();

        assert_eq!(
            json,
            json!({"description": null, "columnId": column_id.to_string()})
        );
    }

    #[rstest]
    fn test_update_request_round_trips_due_date() {
        let due = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let update = TaskUpdate {
            due_date: Some(Some(due)),
            ..TaskUpdate::default()
        };

        let request = UpdateTaskRequest::from(&update);

        assert_eq!(request.into_update().unwrap().due_date, Some(Some(due)));
    }

    #[rstest]
    fn test_success_response_shape() {
        assert_eq!(
            serde_json::to_value(SuccessResponse::OK).unwrap(),
            json!({"success": true})
        );
    }
}
