//! Identifier newtypes.
//!
//! Every entity is keyed by a UUID. Wrapping each one in its own type keeps a
//! `ColumnId` from being passed where a `TaskId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Generates a new time-ordered identifier (UUID v7).
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(value).map(Self)
            }
        }
    };
}

uuid_identifier!(
    /// Identifies the user who owns a project.
    UserId
);
uuid_identifier!(
    /// Identifies a project.
    ProjectId
);
uuid_identifier!(
    /// Identifies a column within a project.
    ColumnId
);
uuid_identifier!(
    /// Identifies a task.
    TaskId
);
uuid_identifier!(
    /// Identifies a label within a project.
    LabelId
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_identifier_display_matches_uuid() {
        let uuid = Uuid::new_v4();
        let task_id = TaskId::from_uuid(uuid);
        assert_eq!(task_id.to_string(), uuid.to_string());
        assert_eq!(task_id.as_uuid(), &uuid);
    }

    #[rstest]
    fn test_identifier_parses_from_str() {
        let column_id = ColumnId::generate();
        let parsed: ColumnId = column_id.to_string().parse().unwrap();
        assert_eq!(parsed, column_id);
    }

    #[rstest]
    fn test_identifier_rejects_garbage() {
        assert!("not-a-uuid".parse::<LabelId>().is_err());
    }

    #[rstest]
    fn test_identifier_serializes_as_bare_string() {
        let project_id = ProjectId::generate();
        let json = serde_json::to_string(&project_id).unwrap();
        assert_eq!(json, format!("\"{project_id}\""));
    }
}
