//! Directory-scoped persistence for one execution (or the supervisor itself).
//!
//! A workspace is a directory plus a logical name. It owns an append-only log
//! file, a structured record store, and any named text files the embedding
//! application wants to keep next to them. Workspaces are created on first
//! use and deleted only by explicit removal of the owning execution.

mod logger;
mod records;


pub use logger::{Level, Logger};
pub use records::{Record, RecordStore};

use crate::error::{Result, VigilError};
use crate::fs::atomic_write_file;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-workspace log file.
pub const LOG_FILE_NAME: &str = "log.txt";

/// Name of the per-workspace record store file.
pub const RECORDS_FILE_NAME: &str = "records.ndjson";

/// A directory-scoped bundle of persisted artifacts.
#[derive(Debug, Clone)]
pub struct Workspace {
    home: PathBuf,
    name: String,
}

impl Workspace {
    /// Create a workspace handle for `home`, deriving the name from the last
    /// path segment (extension stripped). No filesystem access happens here.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let name = home
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { home, name }
    }

    /// Create a workspace handle with an explicit logical name.
    pub fn with_name(home: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            home: home.into(),
            name: name.into(),
        }
    }

    /// The workspace directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// The logical name of this workspace.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of a named file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.home.join(name)
    }

    /// Path of the workspace log file.
    pub fn log_path(&self) -> PathBuf {
        self.file(LOG_FILE_NAME)
    }

    /// A logger appending to this workspace's log file.
    pub fn logger(&self) -> Logger {
        Logger::new(self.log_path())
    }

    /// The workspace's record store.
    pub fn records(&self) -> RecordStore {
        RecordStore::new(self.file(RECORDS_FILE_NAME))
    }

    /// Whether the workspace directory exists.
    pub fn exists(&self) -> bool {
        self.home.is_dir()
    }

    /// Create the workspace directory if missing.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.home).map_err(|e| {
            VigilError::UserError(format!(
                "failed to create workspace '{}': {}",
                self.home.display(),
                e
            ))
        })
    }

    /// Atomically write a named text file.
    pub fn write_text(&self, file_name: &str, content: &str) -> Result<()> {
        atomic_write_file(self.file(file_name), content)
    }

    /// Read a named text file.
    pub fn read_text(&self, file_name: &str) -> Result<String> {
        let path = self.file(file_name);
        fs::read_to_string(&path).map_err(|e| {
            VigilError::UserError(format!("failed to read '{}': {}", path.display(), e))
        })
    }

    /// Delete the entire workspace subtree. Missing directories are fine.
    pub fn delete(&self) {
        let _ = fs::remove_dir_all(&self.home);
    }
}
