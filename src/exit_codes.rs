//! Exit code constants for the vigil CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, nothing to select, invalid state)
//! - 2: Claim refused (execution already running)
//! - 3: Configuration document unreadable
//! - 4: Daemonization failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, no execution to select, or invalid state.
pub const USER_ERROR: i32 = 1;

/// Claim refused: the execution is already owned by a live process.
pub const ALREADY_RUNNING: i32 = 2;

/// Configuration failure: config.json could not be parsed.
pub const CONFIG_FAILURE: i32 = 3;

/// Launch failure: the background worker could not be spawned.
pub const LAUNCH_FAILURE: i32 = 4;
