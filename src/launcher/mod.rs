//! Daemonization of background workers.
//!
//! Starting an execution as a service re-invokes the current executable with
//! `start <name>`, producing a child that outlives the launcher, survives the
//! launching terminal or session going away, and has its stdout/stderr
//! appended to `out.txt` inside the execution's workspace.
//!
//! Process-creation models differ by platform, so the detach itself is a
//! swappable backend behind the [`Launcher`] trait, chosen once at
//! composition time:
//!
//! - [`DetachedSpawn`]: flag-based, using detached-process creation flags on
//!   Windows and a fresh process group on Unix.
//! - [`SessionDetach`]: Unix session detach, where the child calls `setsid()` and
//!   ignores SIGHUP before exec, reparenting it away from any interactive
//!   session.

mod detached;
#[cfg(unix)]
mod session;

pub use detached::DetachedSpawn;
#[cfg(unix)]
pub use session::SessionDetach;

use crate::error::{Result, VigilError};
use crate::execution::Execution;
use std::fs::OpenOptions;
use std::process::{Command, Stdio};

/// File receiving the daemonized child's stdout and stderr (append mode).
pub const OUT_FILE_NAME: &str = "out.txt";

/// Spawns the process that will run an execution's callback in the
/// background.
pub trait Launcher {
    /// Daemonize a re-invocation of `start <name>`. Returns the child pid.
    fn daemonize(&self, execution: &Execution) -> Result<u32>;
}

/// The backend for the current OS family: session detach on Unix, detached
/// spawn on Windows. This is the core's only environment-dependent branch.
pub fn default_launcher() -> Box<dyn Launcher> {
    #[cfg(unix)]
    {
        Box::new(SessionDetach)
    }
    #[cfg(windows)]
    {
        Box::new(DetachedSpawn)
    }
}

/// Build the re-invocation command shared by both backends: current
/// executable, `start <name>`, stdin closed, stdio appended to `out.txt`.
fn daemon_command(execution: &Execution) -> Result<Command> {
    let exe = std::env::current_exe().map_err(|e| {
        VigilError::LaunchError(format!("cannot determine current executable: {}", e))
    })?;

    let out_path = execution.workspace().file(OUT_FILE_NAME);
    let out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&out_path)
        .map_err(|e| {
            VigilError::LaunchError(format!("cannot open '{}': {}", out_path.display(), e))
        })?;
    let err = out.try_clone().map_err(|e| {
        VigilError::LaunchError(format!("cannot clone output handle: {}", e))
    })?;

    let mut command = Command::new(exe);
    command
        .arg("start")
        .arg(execution.name())
        .stdin(Stdio::null())
        .stdout(out)
        .stderr(err);
    Ok(command)
}

fn spawn(mut command: Command) -> Result<u32> {
    let child = command
        .spawn()
        .map_err(|e| VigilError::LaunchError(format!("cannot spawn worker: {}", e)))?;
    Ok(child.id())
}
