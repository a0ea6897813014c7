//! Execution: one named, independently lifecycle-managed unit of work.
//!
//! An execution is a workspace plus two extra files: `__pid__` (the last
//! successful claim) and `config.json` (opaque settings). Everything the
//! supervisor knows about a worker it does not control is derived from those
//! files and the process table; see [`ExecutionStatus`] for the decision
//! procedure.

mod claim;
mod status;


pub use status::ExecutionStatus;

use crate::error::{Result, VigilError};
use crate::proc::{self, ProcessProbe, SystemProbe};
use crate::workspace::{Logger, RecordStore, Workspace};
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Name of the pid file inside an execution workspace.
pub const PID_FILE_NAME: &str = "__pid__";

/// Name of the transient claim lock next to the pid file.
pub const PID_LOCK_FILE_NAME: &str = "__pid__.lock";

/// Name of the configuration document.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Opaque key→value configuration; key semantics belong to the embedding
/// application.
pub type ConfigDoc = serde_json::Map<String, Value>;

/// One named unit of long-running work.
#[derive(Debug, Clone)]
pub struct Execution {
    workspace: Workspace,
}

impl Execution {
    /// Handle for the execution living at `home` (name derived from the last
    /// path segment). No filesystem access happens here.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self {
            workspace: Workspace::new(home),
        }
    }

    /// Handle with an explicit name.
    pub fn with_name(home: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            workspace: Workspace::with_name(home, name),
        }
    }

    pub fn name(&self) -> &str {
        self.workspace.name()
    }

    pub fn home(&self) -> &Path {
        self.workspace.home()
    }

    /// The underlying workspace (log, records, named files).
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn logger(&self) -> Logger {
        self.workspace.logger()
    }

    pub fn records(&self) -> RecordStore {
        self.workspace.records()
    }

    pub fn pid_path(&self) -> PathBuf {
        self.workspace.file(PID_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.workspace.file(CONFIG_FILE_NAME)
    }

    /// Bootstrap the workspace: directory, empty log file, `{}` config.
    /// Idempotent; whatever already exists is left alone.
    pub fn init(&self) -> Result<()> {
        self.workspace.ensure_dir()?;

        let log_path = self.workspace.log_path();
        if !log_path.is_file() {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .map_err(|e| {
                    VigilError::UserError(format!(
                        "failed to create log file '{}': {}",
                        log_path.display(),
                        e
                    ))
                })?;
        }

        if !self.config_path().is_file() {
            self.write_config(&ConfigDoc::new())?;
        }

        Ok(())
    }

    /// Derive the current status from the real process table.
    pub fn status(&self) -> ExecutionStatus {
        self.status_with(&SystemProbe)
    }

    /// Derive the current status against an explicit process probe.
    ///
    /// Evaluated in this exact order; never raises. Missing or unreadable
    /// files degrade to an enum value.
    pub fn status_with(&self, probe: &dyn ProcessProbe) -> ExecutionStatus {
        if !self.workspace.exists() {
            return ExecutionStatus::NotFound;
        }
        if !self.pid_path().is_file() {
            return ExecutionStatus::Stopped;
        }
        let Some(pid) = self.pid() else {
            return ExecutionStatus::AbnormalPid;
        };
        match probe.find(pid) {
            // No such entry: a clean prior exit, not an anomaly.
            None => ExecutionStatus::Stopped,
            Some(info) if info.alive => ExecutionStatus::Running,
            Some(_) => ExecutionStatus::AbnormalProc,
        }
    }

    /// The recorded pid, if present and parseable.
    pub fn pid(&self) -> Option<u32> {
        let content = std::fs::read_to_string(self.pid_path()).ok()?;
        content.trim().parse().ok()
    }

    /// Claim ownership of this execution by recording `pid`.
    ///
    /// Fails with [`VigilError::AlreadyRunning`] iff the status is `Running`
    /// at the moment of the call (or another claim is in flight). Otherwise
    /// overwrites the pid file; calling twice with the same value is
    /// idempotent. The check and the write are serialized by a transient
    /// `__pid__.lock`.
    pub fn set_pid(&self, pid: u32) -> Result<()> {
        self.set_pid_with(pid, &SystemProbe)
    }

    /// `set_pid` against an explicit process probe.
    pub fn set_pid_with(&self, pid: u32, probe: &dyn ProcessProbe) -> Result<()> {
        let lock_path = self.workspace.file(PID_LOCK_FILE_NAME);
        let _guard = claim::acquire(&lock_path, self.name())?;

        if self.status_with(probe) == ExecutionStatus::Running {
            return Err(VigilError::AlreadyRunning(self.name().to_string()));
        }

        crate::fs::atomic_write_file(self.pid_path(), &pid.to_string())
    }

    /// Signal the recorded pid: SIGINT for a graceful stop, SIGKILL when
    /// `force`. Fire-and-forget: no verification that the signaled process
    /// is the originally-claimed worker, no wait for it to exit. A pid file
    /// that is absent or unparseable means there is nothing to signal.
    pub fn stop(&self, force: bool) -> Result<()> {
        let Some(pid) = self.pid() else {
            return Ok(());
        };

        let result = if force {
            proc::kill(pid)
        } else {
            proc::interrupt(pid)
        };

        result.map_err(|e| {
            VigilError::UserError(format!(
                "failed to signal pid {} of '{}': {}",
                pid,
                self.name(),
                e
            ))
        })
    }

    /// Read the configuration document.
    ///
    /// Three-way result: `Ok(Some(doc))` on success, `Ok(None)` when the file
    /// does not exist, `Err(ConfigError)` when the document is corrupt. The
    /// absent case is never represented as a failure.
    pub fn read_config(&self) -> Result<Option<ConfigDoc>> {
        let path = self.config_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VigilError::ConfigError(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| VigilError::ConfigError(format!("{}: {}", path.display(), e)))?;

        match value {
            Value::Object(map) => Ok(Some(map)),
            other => Err(VigilError::ConfigError(format!(
                "{}: expected an object, got {}",
                path.display(),
                json_type_name(&other)
            ))),
        }
    }

    /// The "safe" read: absent and corrupt documents both degrade to `{}`.
    pub fn read_config_or_default(&self) -> ConfigDoc {
        self.read_config().ok().flatten().unwrap_or_default()
    }

    /// Atomically replace the configuration document.
    pub fn write_config(&self, doc: &ConfigDoc) -> Result<()> {
        let json = serde_json::to_string_pretty(&Value::Object(doc.clone()))
            .map_err(|e| VigilError::ConfigError(format!("failed to serialize config: {}", e)))?;
        self.workspace.write_text(CONFIG_FILE_NAME, &(json + "\n"))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
