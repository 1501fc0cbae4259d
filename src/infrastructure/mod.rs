//! Infrastructure module for storage and sessions.
//!
//! This module contains the repository traits, the in-memory and `PostgreSQL`
//! stores, runtime backend selection and the session registry.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod session;

pub use factory::{
    ConfigurationError, FactoryError, Repositories, RepositoryConfig, RepositoryConfigBuilder,
    RepositoryFactory, StorageMode,
};
pub use in_memory::InMemoryBoardStore;
pub use postgres::{PostgresBoardStore, SCHEMA};
pub use repository::{
    ColumnRepository, LabelRepository, ProjectRepository, RepositoryError, RepositoryFuture,
    TaskRepository,
};
pub use session::SessionRegistry;
