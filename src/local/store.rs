//! File-backed persistence, export and import for the local-only board.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::board::{LocalBoard, LocalColumn, LocalLabel};

/// Schema version of the persisted state file.
pub const STATE_VERSION: u32 = 0;

/// Format version written into backups.
pub const BACKUP_VERSION: &str = "1.0";

/// Default state file name.
pub const STORAGE_FILE_NAME: &str = "taskflow-storage.json";

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored board is unreadable: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Failed to import: Invalid JSON file")]
    InvalidJson,

    #[error("Invalid backup file: missing {0} data")]
    InvalidBackup(&'static str),
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    state: LocalBoard,
    version: u32,
}

/// A portable copy of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub columns: Vec<LocalColumn>,
    pub labels: Vec<LocalLabel>,
    pub exported_at: String,
    pub version: String,
}

/// File name offered for a backup taken on `date`.
#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("taskflow-backup-{}.json", date.format("%Y-%m-%d"))
}

/// The local board together with the file it is persisted to.
///
/// Every change is written through before it becomes visible.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    board: LocalBoard,
}

impl LocalStore {
    /// Loads the board from `path`, or starts from the default board when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a saved board.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LocalStoreError> {
        let path = path.into();
        let board = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str::<PersistedState>(&contents)
                    .map_err(LocalStoreError::Corrupt)?
                    .state
            }
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No saved board, starting from defaults");
                LocalBoard::default()
            }
            Err(error) => return Err(error.into()),
        };

        Ok(Self { path, board })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn board(&self) -> &LocalBoard {
        &self.board
    }

    /// Applies a board operation and persists the result.
    ///
    /// # Errors
    ///
    /// Returns an error when the new board cannot be written; the in-memory
    /// board is left as it was.
    pub fn update(
        &mut self,
        operation: impl FnOnce(LocalBoard) -> LocalBoard,
    ) -> Result<&LocalBoard, LocalStoreError> {
        let next = operation(self.board.clone());
        self.replace(next)
    }

    /// Resets to the default board and removes the saved file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be removed.
    pub fn clear(&mut self) -> Result<&LocalBoard, LocalStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }
        self.board = LocalBoard::default();
        Ok(&self.board)
    }

    /// Snapshot of the board for download.
    #[must_use]
    pub fn export(&self, now: DateTime<Utc>) -> Backup {
        Backup {
            columns: self.board.columns.clone(),
            labels: self.board.labels.clone(),
            exported_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: BACKUP_VERSION.to_string(),
        }
    }

    /// Pretty-printed backup document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backup cannot be serialized.
    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export(now))
    }

    /// Replaces the board with the columns and labels of a backup document.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::InvalidJson`] when the document is not valid
    /// JSON, [`LocalStoreError::InvalidBackup`] when it lacks the columns or
    /// labels arrays, and an I/O error when the result cannot be saved.
    pub fn import(&mut self, json: &str) -> Result<&LocalBoard, LocalStoreError> {
        let board = parse_backup(json)?;
        self.replace(board)
    }

    fn replace(&mut self, board: LocalBoard) -> Result<&LocalBoard, LocalStoreError> {
        self.persist(&board)?;
        self.board = board;
        Ok(&self.board)
    }

    fn persist(&self, board: &LocalBoard) -> Result<(), LocalStoreError> {
        let state = PersistedState {
            state: board.clone(),
            version: STATE_VERSION,
        };
        let contents = serde_json::to_vec(&state).map_err(LocalStoreError::Corrupt)?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, contents)?;
        fs::rename(&staging, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved local board");
        Ok(())
    }
}

fn parse_backup(json: &str) -> Result<LocalBoard, LocalStoreError> {
    let document: Value = serde_json::from_str(json).map_err(|_| LocalStoreError::InvalidJson)?;

    let columns = match document.get("columns") {
        Some(columns @ Value::Array(_)) => columns.clone(),
        _ => return Err(LocalStoreError::InvalidBackup("columns")),
    };
    let labels = match document.get("labels") {
        Some(labels @ Value::Array(_)) => labels.clone(),
        _ => return Err(LocalStoreError::InvalidBackup("labels")),
    };

    let columns = serde_json::from_value(columns).map_err(|_| LocalStoreError::InvalidJson)?;
    let labels = serde_json::from_value(labels).map_err(|_| LocalStoreError::InvalidJson)?;

    Ok(LocalBoard { columns, labels })
}
