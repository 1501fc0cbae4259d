//! Local-only mode: a single board kept in a JSON file, no server involved.

pub mod board;
pub mod store;

pub use board::{LocalBoard, LocalColumn, LocalLabel, LocalTask, LocalTaskUpdate};
pub use store::{
    BACKUP_VERSION, Backup, LocalStore, LocalStoreError, STATE_VERSION, STORAGE_FILE_NAME,
    backup_file_name,
};
