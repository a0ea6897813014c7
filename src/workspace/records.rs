//! Structured record store: named tables of timestamped rows.
//!
//! Rows live in a single NDJSON file (`records.ndjson`), one JSON object per
//! line, each carrying its table name and an RFC3339 timestamp. Appends are
//! cheap; rewrites (for update-style workloads) replace the file atomically.
//! The table names and row contents are application-defined and opaque to the
//! supervisor core.

use crate::error::{Result, VigilError};
use crate::fs::atomic_write;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// One timestamped row in a named table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Table this row belongs to.
    pub table: String,

    /// When the row was written (or last rewritten with `Record::touch`).
    pub ts: DateTime<Utc>,

    /// Application-defined row contents.
    pub data: Value,
}

impl Record {
    /// Create a row stamped with the current time.
    pub fn new(table: impl Into<String>, data: Value) -> Self {
        Self {
            table: table.into(),
            ts: Utc::now(),
            data,
        }
    }

    /// Refresh the row's timestamp in place.
    pub fn touch(&mut self) {
        self.ts = Utc::now();
    }
}

/// Handle on one workspace's record file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one row to a table, stamped with the current time.
    pub fn append(&self, table: &str, data: Value) -> Result<()> {
        let record = Record::new(table, data);
        let line = serde_json::to_string(&record)
            .map_err(|e| VigilError::UserError(format!("failed to serialize record: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                VigilError::UserError(format!(
                    "failed to open record store '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", line).map_err(|e| {
            VigilError::UserError(format!(
                "failed to append to record store '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    /// All rows of a table, in append order. A missing file is an empty table.
    pub fn rows(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.table == table)
            .collect())
    }

    /// The most recently appended row of a table.
    pub fn last(&self, table: &str) -> Result<Option<Record>> {
        Ok(self.rows(table)?.pop())
    }

    /// Number of rows in a table.
    pub fn count(&self, table: &str) -> Result<usize> {
        Ok(self.rows(table)?.len())
    }

    /// Replace all rows of one table, leaving other tables untouched.
    pub fn rewrite(&self, table: &str, rows: Vec<Record>) -> Result<()> {
        let mut kept: Vec<Record> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.table != table)
            .collect();
        kept.extend(rows.into_iter().map(|mut r| {
            r.table = table.to_string();
            r
        }));

        let mut out = String::new();
        for record in &kept {
            let line = serde_json::to_string(record)
                .map_err(|e| VigilError::UserError(format!("failed to serialize record: {}", e)))?;
            out.push_str(&line);
            out.push('\n');
        }
        atomic_write(&self.path, out.as_bytes())
    }

    fn read_all(&self) -> Result<Vec<Record>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(VigilError::UserError(format!(
                    "failed to read record store '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let mut records = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line).map_err(|e| {
                VigilError::UserError(format!(
                    "corrupt record in '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;
            records.push(record);
        }
        Ok(records)
    }
}
