//! Flag-based detached spawn backend.

use super::{daemon_command, spawn, Launcher};
use crate::error::Result;
use crate::execution::Execution;

/// Detach the child through process-creation flags: no console and a fresh
/// process group on Windows, a fresh process group on Unix. No shell is
/// involved and nothing beyond the redirected stdio is inherited.
#[derive(Debug, Default)]
pub struct DetachedSpawn;

impl Launcher for DetachedSpawn {
    #[cfg(windows)]
    fn daemonize(&self, execution: &Execution) -> Result<u32> {
        use std::os::windows::process::CommandExt;

        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

        let mut command = daemon_command(execution)?;
        command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        spawn(command)
    }

    #[cfg(unix)]
    fn daemonize(&self, execution: &Execution) -> Result<u32> {
        use std::os::unix::process::CommandExt;

        let mut command = daemon_command(execution)?;
        // A zero pgid puts the child in its own process group, so terminal
        // job control signals aimed at the launcher's group miss it.
        command.process_group(0);
        spawn(command)
    }
}
