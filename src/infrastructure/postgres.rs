//! `PostgreSQL` board store.
//!
//! One relational table per entity. Deleting a project, column or task
//! cascades through foreign keys; the composite primary key on `task_labels`
//! rejects repeated associations.
//!
//! # Table Schema
//!
//! See [`SCHEMA`]. The `order` field is stored as `sort_order` because `order`
//! is a reserved word.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::{
    Column, ColumnId, ColumnUpdate, Label, LabelId, Priority, Project, ProjectId, ProjectSeed,
    ProjectTree, Task, TaskId, TaskLabel, TaskUpdate, UserId,
};
use crate::infrastructure::{
    ColumnRepository, LabelRepository, ProjectRepository, RepositoryError, RepositoryFuture,
    TaskRepository,
};

/// DDL applied by [`PostgresBoardStore::migrate`]. Idempotent.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS projects (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    user_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_projects_user_id ON projects(user_id);

CREATE TABLE IF NOT EXISTS columns (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    sort_order INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_columns_project_id ON columns(project_id);

CREATE TABLE IF NOT EXISTS tasks (
    id UUID PRIMARY KEY,
    column_id UUID NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    priority TEXT NOT NULL DEFAULT 'medium',
    due_date TIMESTAMPTZ,
    sort_order INTEGER NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
CREATE INDEX IF NOT EXISTS idx_tasks_column_id ON tasks(column_id);

CREATE TABLE IF NOT EXISTS labels (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    color TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_labels_project_id ON labels(project_id);

CREATE TABLE IF NOT EXISTS task_labels (
    task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
    label_id UUID NOT NULL REFERENCES labels(id) ON DELETE CASCADE,
    PRIMARY KEY (task_id, label_id)
);
";

const TASK_COLUMNS: &str =
    "id, column_id, title, description, priority, due_date, sort_order, created_at, updated_at";

// =============================================================================
// Row decoding
// =============================================================================

type ProjectRow = (Uuid, String, Uuid, DateTime<Utc>, DateTime<Utc>);
type ColumnRow = (Uuid, Uuid, String, i32);
type LabelRow = (Uuid, Uuid, String, String);
type TaskRow = (
    Uuid,
    Uuid,
    String,
    Option<String>,
    String,
    Option<DateTime<Utc>>,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn project_from_row((id, name, user_id, created_at, updated_at): ProjectRow) -> Project {
    Project {
        id: ProjectId::from_uuid(id),
        name,
        owner: UserId::from_uuid(user_id),
        created_at,
        updated_at,
    }
}

fn column_from_row((id, project_id, title, order): ColumnRow) -> Column {
    Column::new(
        ColumnId::from_uuid(id),
        ProjectId::from_uuid(project_id),
        title,
        order,
    )
}

fn label_from_row((id, project_id, name, color): LabelRow) -> Label {
    Label::new(
        LabelId::from_uuid(id),
        ProjectId::from_uuid(project_id),
        name,
        color,
    )
}

fn task_from_row(row: TaskRow) -> Result<Task, RepositoryError> {
    let (id, column_id, title, description, priority, due_date, order, created_at, updated_at) =
        row;
    let priority: Priority = priority
        .parse()
        .map_err(|error: crate::domain::InvalidPriority| {
            RepositoryError::SerializationError(error.to_string())
        })?;

    Ok(Task {
        id: TaskId::from_uuid(id),
        column_id: ColumnId::from_uuid(column_id),
        title,
        description,
        priority,
        due_date,
        order,
        created_at,
        updated_at,
    })
}

fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

/// Maps constraint violations to domain errors; everything else is a
/// database error.
fn write_error(error: sqlx::Error, subject: &str) -> RepositoryError {
    match &error {
        sqlx::Error::Database(database) if database.is_unique_violation() => {
            RepositoryError::AlreadyExists(subject.to_string())
        }
        sqlx::Error::Database(database) if database.is_foreign_key_violation() => {
            RepositoryError::NotFound(subject.to_string())
        }
        _ => database_error(error),
    }
}

// =============================================================================
// Store
// =============================================================================

/// `PostgreSQL` implementation of all board repositories.
#[derive(Debug, Clone)]
pub struct PostgresBoardStore {
    pool: PgPool,
}

impl PostgresBoardStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the tables if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` when the DDL cannot be applied.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }
}

async fn load_tree(pool: &PgPool, project: Project) -> Result<ProjectTree, RepositoryError> {
    let project_id = *project.id.as_uuid();

    let columns: Vec<ColumnRow> = sqlx::query_as(
        "SELECT id, project_id, title, sort_order FROM columns \
         WHERE project_id = $1 ORDER BY sort_order, id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let tasks: Vec<TaskRow> = sqlx::query_as(&format!(
        "SELECT t.{} FROM tasks t JOIN columns c ON c.id = t.column_id \
         WHERE c.project_id = $1 ORDER BY t.sort_order, t.id",
        TASK_COLUMNS.replace(", ", ", t.")
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let labels: Vec<LabelRow> = sqlx::query_as(
        "SELECT id, project_id, name, color FROM labels WHERE project_id = $1 ORDER BY id",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let associations: Vec<(Uuid, Uuid)> = sqlx::query_as(
        "SELECT tl.task_id, tl.label_id FROM task_labels tl \
         JOIN labels l ON l.id = tl.label_id WHERE l.project_id = $1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .map_err(database_error)?;

    let tasks = tasks
        .into_iter()
        .map(task_from_row)
        .collect::<Result<Vec<_>, _>>()?;
    let associations: Vec<TaskLabel> = associations
        .into_iter()
        .map(|(task_id, label_id)| {
            TaskLabel::new(TaskId::from_uuid(task_id), LabelId::from_uuid(label_id))
        })
        .collect();

    Ok(ProjectTree::assemble(
        project,
        columns.into_iter().map(column_from_row).collect(),
        tasks,
        labels.into_iter().map(label_from_row).collect(),
        &associations,
    ))
}

async fn insert_seed(
    transaction: &mut Transaction<'static, Postgres>,
    seed: &ProjectSeed,
) -> Result<(), RepositoryError> {
    let project = &seed.project;
    sqlx::query(
        "INSERT INTO projects (id, name, user_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(project.id.as_uuid())
    .bind(&project.name)
    .bind(project.owner.as_uuid())
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(&mut **transaction)
    .await
    .map_err(|error| write_error(error, &format!("project {}", project.id)))?;

    for column in &seed.columns {
        sqlx::query(
            "INSERT INTO columns (id, project_id, title, sort_order) VALUES ($1, $2, $3, $4)",
        )
        .bind(column.id.as_uuid())
        .bind(column.project_id.as_uuid())
        .bind(&column.title)
        .bind(column.order)
        .execute(&mut **transaction)
        .await
        .map_err(database_error)?;
    }

    for label in &seed.labels {
        sqlx::query("INSERT INTO labels (id, project_id, name, color) VALUES ($1, $2, $3, $4)")
            .bind(label.id.as_uuid())
            .bind(label.project_id.as_uuid())
            .bind(&label.name)
            .bind(&label.color)
            .execute(&mut **transaction)
            .await
            .map_err(database_error)?;
    }

    Ok(())
}

impl ProjectRepository for PostgresBoardStore {
    fn list_trees(&self, owner: UserId) -> RepositoryFuture<Vec<ProjectTree>> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let rows: Vec<ProjectRow> = sqlx::query_as(
                "SELECT id, name, user_id, created_at, updated_at FROM projects \
                 WHERE user_id = $1 ORDER BY created_at, id",
            )
            .bind(owner.as_uuid())
            .fetch_all(&pool)
            .await
            .map_err(database_error)?;

            let mut trees = Vec::with_capacity(rows.len());
            for row in rows {
                trees.push(load_tree(&pool, project_from_row(row)).await?);
            }
            Ok(trees)
        })
    }

    fn create_with_defaults(&self, seed: ProjectSeed) -> RepositoryFuture<ProjectTree> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;
            insert_seed(&mut transaction, &seed).await?;
            transaction.commit().await.map_err(database_error)?;
            Ok(seed.into_tree())
        })
    }
}

impl ColumnRepository for PostgresBoardStore {
    fn append(&self, column: Column) -> RepositoryFuture<Column> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let row: ColumnRow = sqlx::query_as(
                "INSERT INTO columns (id, project_id, title, sort_order) \
                 SELECT $1, $2, $3, COUNT(*)::INTEGER FROM columns WHERE project_id = $2 \
                 RETURNING id, project_id, title, sort_order",
            )
            .bind(column.id.as_uuid())
            .bind(column.project_id.as_uuid())
            .bind(&column.title)
            .fetch_one(&pool)
            .await
            .map_err(|error| write_error(error, &format!("project {}", column.project_id)))?;

            Ok(column_from_row(row))
        })
    }

    fn update(&self, id: ColumnId, update: ColumnUpdate) -> RepositoryFuture<Column> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let row: Option<ColumnRow> = sqlx::query_as(
                "UPDATE columns SET title = COALESCE($2, title) WHERE id = $1 \
                 RETURNING id, project_id, title, sort_order",
            )
            .bind(id.as_uuid())
            .bind(update.title)
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            row.map(column_from_row)
                .ok_or_else(|| RepositoryError::NotFound(format!("column {id}")))
        })
    }

    fn delete(&self, id: ColumnId) -> RepositoryFuture<()> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let project: Option<(Uuid,)> =
                sqlx::query_as("SELECT project_id FROM columns WHERE id = $1 FOR UPDATE")
                    .bind(id.as_uuid())
                    .fetch_optional(&mut *transaction)
                    .await
                    .map_err(database_error)?;
            let Some((project_id,)) = project else {
                return Err(RepositoryError::NotFound(format!("column {id}")));
            };

            // Lock the sibling set so two concurrent deletes cannot empty it.
            let siblings: Vec<(Uuid,)> =
                sqlx::query_as("SELECT id FROM columns WHERE project_id = $1 FOR UPDATE")
                    .bind(project_id)
                    .fetch_all(&mut *transaction)
                    .await
                    .map_err(database_error)?;
            if siblings.len() <= 1 {
                return Err(RepositoryError::InvariantViolation(format!(
                    "column {id} is the last column of project {project_id}"
                )));
            }

            sqlx::query("DELETE FROM columns WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *transaction)
                .await
                .map_err(database_error)?;

            transaction.commit().await.map_err(database_error)
        })
    }
}

impl TaskRepository for PostgresBoardStore {
    fn find_by_id(&self, id: TaskId) -> RepositoryFuture<Option<Task>> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let row: Option<TaskRow> =
                sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
                    .bind(id.as_uuid())
                    .fetch_optional(&pool)
                    .await
                    .map_err(database_error)?;

            row.map(task_from_row).transpose()
        })
    }

    fn append(&self, task: Task) -> RepositoryFuture<Task> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let row: TaskRow = sqlx::query_as(&format!(
                "INSERT INTO tasks ({TASK_COLUMNS}) \
                 SELECT $1, $2, $3, $4, $5, $6, COUNT(*)::INTEGER, $7, $8 \
                 FROM tasks WHERE column_id = $2 \
                 RETURNING {TASK_COLUMNS}"
            ))
            .bind(task.id.as_uuid())
            .bind(task.column_id.as_uuid())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority.as_str())
            .bind(task.due_date)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&pool)
            .await
            .map_err(|error| write_error(error, &format!("column {}", task.column_id)))?;

            task_from_row(row)
        })
    }

    fn update(
        &self,
        id: TaskId,
        update: TaskUpdate,
        timestamp: DateTime<Utc>,
    ) -> RepositoryFuture<Task> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let mut transaction = pool.begin().await.map_err(database_error)?;

            let row: Option<TaskRow> = sqlx::query_as(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *transaction)
            .await
            .map_err(database_error)?;
            let Some(row) = row else {
                return Err(RepositoryError::NotFound(format!("task {id}")));
            };

            let target = update.column_id;
            let task = update.apply(task_from_row(row)?, timestamp);

            sqlx::query(
                "UPDATE tasks SET column_id = $2, title = $3, description = $4, \
                 priority = $5, due_date = $6, updated_at = $7 WHERE id = $1",
            )
            .bind(task.id.as_uuid())
            .bind(task.column_id.as_uuid())
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority.as_str())
            .bind(task.due_date)
            .bind(task.updated_at)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                let subject =
                    target.map_or_else(|| format!("task {id}"), |c| format!("column {c}"));
                write_error(error, &subject)
            })?;

            transaction.commit().await.map_err(database_error)?;
            Ok(task)
        })
    }

    fn delete(&self, id: TaskId) -> RepositoryFuture<()> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("task {id}")));
            }
            Ok(())
        })
    }
}

impl LabelRepository for PostgresBoardStore {
    fn insert(&self, label: Label) -> RepositoryFuture<Label> {
        let pool = self.pool.clone();

        Box::pin(async move {
            sqlx::query("INSERT INTO labels (id, project_id, name, color) VALUES ($1, $2, $3, $4)")
                .bind(label.id.as_uuid())
                .bind(label.project_id.as_uuid())
                .bind(&label.name)
                .bind(&label.color)
                .execute(&pool)
                .await
                .map_err(|error| write_error(error, &format!("project {}", label.project_id)))?;

            Ok(label)
        })
    }

    fn delete(&self, id: LabelId) -> RepositoryFuture<()> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let result = sqlx::query("DELETE FROM labels WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("label {id}")));
            }
            Ok(())
        })
    }

    fn attach(&self, association: TaskLabel) -> RepositoryFuture<TaskLabel> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let TaskLabel { task_id, label_id } = association;

            let projects: Option<(Uuid, Uuid)> = sqlx::query_as(
                "SELECT c.project_id, l.project_id FROM tasks t \
                 JOIN columns c ON c.id = t.column_id, labels l \
                 WHERE t.id = $1 AND l.id = $2",
            )
            .bind(task_id.as_uuid())
            .bind(label_id.as_uuid())
            .fetch_optional(&pool)
            .await
            .map_err(database_error)?;

            match projects {
                None => {
                    return Err(RepositoryError::NotFound(format!(
                        "task {task_id} or label {label_id}"
                    )));
                }
                Some((task_project, label_project)) if task_project != label_project => {
                    return Err(RepositoryError::InvariantViolation(format!(
                        "label {label_id} belongs to another project than task {task_id}"
                    )));
                }
                Some(_) => {}
            }

            sqlx::query("INSERT INTO task_labels (task_id, label_id) VALUES ($1, $2)")
                .bind(task_id.as_uuid())
                .bind(label_id.as_uuid())
                .execute(&pool)
                .await
                .map_err(|error| {
                    write_error(error, &format!("label {label_id} on task {task_id}"))
                })?;

            Ok(association)
        })
    }

    fn detach(&self, association: TaskLabel) -> RepositoryFuture<()> {
        let pool = self.pool.clone();

        Box::pin(async move {
            let TaskLabel { task_id, label_id } = association;
            let result = sqlx::query("DELETE FROM task_labels WHERE task_id = $1 AND label_id = $2")
                .bind(task_id.as_uuid())
                .bind(label_id.as_uuid())
                .execute(&pool)
                .await
                .map_err(database_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!(
                    "label {label_id} on task {task_id}"
                )));
            }
            Ok(())
        })
    }
}
