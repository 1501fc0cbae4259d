//! Repository factory for runtime backend selection.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when `STORAGE_MODE=postgres`)
//!
//! # Example
//!
//! ```ignore
//! let config = RepositoryConfig::from_env()?;
//! let repositories = RepositoryFactory::new(config).create().await?;
//! let trees = repositories.project_repository.list_trees(owner).await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use super::{
    ColumnRepository, InMemoryBoardStore, LabelRepository, PostgresBoardStore, ProjectRepository,
    TaskRepository,
};

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for board data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local tables. Data is lost on restart.
    #[default]
    InMemory,
    /// `PostgreSQL` storage.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Configuration for the repository factory.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfig {
    pub storage_mode: StorageMode,
    /// `PostgreSQL` connection URL (required when `storage_mode` is `Postgres`).
    pub database_url: Option<String>,
}

impl RepositoryConfig {
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::default()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if `STORAGE_MODE` is invalid or
    /// `DATABASE_URL` is missing when `STORAGE_MODE=postgres`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(value) => value.parse()?,
            Err(env::VarError::NotPresent) => StorageMode::default(),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigurationError::InvalidStorageMode(
                    "<non-UTF-8 value>".to_string(),
                ));
            }
        };

        // Empty or whitespace-only counts as unset.
        let database_url = env::var("DATABASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let config = Self {
            storage_mode,
            database_url,
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` when Postgres is
    /// selected without a URL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_mode == StorageMode::Postgres && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

/// Builder for `RepositoryConfig`.
#[derive(Debug, Clone, Default)]
pub struct RepositoryConfigBuilder {
    storage_mode: StorageMode,
    database_url: Option<String>,
}

impl RepositoryConfigBuilder {
    #[must_use]
    pub const fn storage_mode(mut self, mode: StorageMode) -> Self {
        self.storage_mode = mode;
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// # Errors
    ///
    /// Returns `ConfigurationError` if the configuration is invalid.
    pub fn build(self) -> Result<RepositoryConfig, ConfigurationError> {
        let config = RepositoryConfig {
            storage_mode: self.storage_mode,
            database_url: self.database_url,
        };
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    #[error("DATABASE_URL environment variable is required when STORAGE_MODE=postgres")]
    MissingDatabaseUrl,

    #[error("Invalid session entry: '{0}'. Expected 'token=user-uuid'")]
    InvalidSessionEntry(String),
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    #[error("Database migration error: {0}")]
    Migration(String),
}

// =============================================================================
// Repository Factory
// =============================================================================

/// The repositories the API needs, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub project_repository: Arc<dyn ProjectRepository + Send + Sync>,
    pub column_repository: Arc<dyn ColumnRepository + Send + Sync>,
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    pub label_repository: Arc<dyn LabelRepository + Send + Sync>,
}

impl Repositories {
    /// Exposes one store through every repository handle.
    pub fn from_store<S>(store: S) -> Self
    where
        S: ProjectRepository + ColumnRepository + TaskRepository + LabelRepository + 'static,
    {
        let store = Arc::new(store);
        Self {
            project_repository: store.clone(),
            column_repository: store.clone(),
            task_repository: store.clone(),
            label_repository: store,
        }
    }

    /// Fresh in-memory repositories.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_store(InMemoryBoardStore::new())
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Repositories")
            .field("project_repository", &"Arc<dyn ProjectRepository>")
            .field("column_repository", &"Arc<dyn ColumnRepository>")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("label_repository", &"Arc<dyn LabelRepository>")
            .finish()
    }
}

/// Creates repositories for the configured storage mode.
#[derive(Debug, Clone)]
pub struct RepositoryFactory {
    config: RepositoryConfig,
}

impl RepositoryFactory {
    #[must_use]
    pub const fn new(config: RepositoryConfig) -> Self {
        Self { config }
    }

    /// # Errors
    ///
    /// Returns `FactoryError::Configuration` if environment configuration is invalid.
    pub fn from_env() -> Result<Self, FactoryError> {
        let config = RepositoryConfig::from_env()?;
        Ok(Self::new(config))
    }

    #[must_use]
    pub const fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Creates all repositories, connecting and migrating the database when
    /// `PostgreSQL` is selected.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the connection or the schema migration fails.
    pub async fn create(&self) -> Result<Repositories, FactoryError> {
        match self.config.storage_mode {
            StorageMode::InMemory => Ok(Repositories::in_memory()),
            StorageMode::Postgres => {
                let pool = self.create_postgres_pool().await?;
                let store = PostgresBoardStore::new(pool);
                store
                    .migrate()
                    .await
                    .map_err(|error| FactoryError::Migration(error.to_string()))?;
                Ok(Repositories::from_store(store))
            }
        }
    }

    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPool::connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================
