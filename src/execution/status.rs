//! Execution status derivation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Liveness status of one execution.
///
/// A status is a pure function of the workspace directory, the pid file, and
/// the current process table. It is never persisted; every caller recomputes
/// it at the moment of use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The workspace directory does not exist.
    NotFound,
    /// No pid file, or the recorded pid maps to no process (clean prior exit).
    Stopped,
    /// A live process holds the recorded pid.
    Running,
    /// The pid file exists but its content is not a parseable integer.
    AbnormalPid,
    /// The recorded pid is in the process table but the process is not alive.
    AbnormalProc,
}

impl ExecutionStatus {
    /// Human-readable label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            ExecutionStatus::NotFound => "Not exists",
            ExecutionStatus::Stopped => "Stopped",
            ExecutionStatus::Running => "Running",
            ExecutionStatus::AbnormalPid => "Abnormal (pid)",
            ExecutionStatus::AbnormalProc => "Abnormal (proc)",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStatus::NotFound => "not_found",
            ExecutionStatus::Stopped => "stopped",
            ExecutionStatus::Running => "running",
            ExecutionStatus::AbnormalPid => "abnormal_pid",
            ExecutionStatus::AbnormalProc => "abnormal_proc",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::AbnormalPid).unwrap();
        assert_eq!(json, "\"abnormal_pid\"");
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(ExecutionStatus::NotFound.to_string(), "not_found");
        assert_eq!(ExecutionStatus::Running.to_string(), "running");
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(ExecutionStatus::Stopped.label(), "Stopped");
        assert_eq!(ExecutionStatus::AbnormalProc.label(), "Abnormal (proc)");
    }
}
