//! Error types for the vigil CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for vigil operations.
///
/// Each variant maps to a specific exit code. Worker business-logic faults are
/// deliberately *not* represented here: the injected runner callback returns
/// `anyhow::Result`, and its failures are absorbed and logged at the
/// `Supervisor::execute` boundary instead of propagating as `VigilError`.
#[derive(Error, Debug)]
pub enum VigilError {
    /// User provided invalid arguments or the system is in an invalid state.
    #[error("{0}")]
    UserError(String),

    /// A pid claim was refused because a live process already owns the name.
    #[error("execution '{0}' is already running")]
    AlreadyRunning(String),

    /// The configuration document could not be parsed.
    #[error("config read failed: {0}")]
    ConfigError(String),

    /// The background worker process could not be spawned.
    #[error("launch failed: {0}")]
    LaunchError(String),
}

impl VigilError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            VigilError::UserError(_) => exit_codes::USER_ERROR,
            VigilError::AlreadyRunning(_) => exit_codes::ALREADY_RUNNING,
            VigilError::ConfigError(_) => exit_codes::CONFIG_FAILURE,
            VigilError::LaunchError(_) => exit_codes::LAUNCH_FAILURE,
        }
    }
}

/// Result type alias for vigil operations.
pub type Result<T> = std::result::Result<T, VigilError>;
