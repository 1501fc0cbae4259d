//! Taskflow
//!
//! Kanban board backend: projects with ordered columns, tasks and labels,
//! served as HTTP JSON, plus a client data-access layer and a local-only board
//! persisted to a file.

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
pub mod local;
