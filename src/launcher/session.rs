//! Session-detach spawn backend (Unix).

use super::{daemon_command, spawn, Launcher};
use crate::error::Result;
use crate::execution::Execution;
use std::os::unix::process::CommandExt;

/// Detach the child by starting a new session: between fork and exec the
/// child calls `setsid()` and sets SIGHUP to ignore, so it is reparented away
/// from the interactive session and survives the terminal closing. Achieves
/// the same outlive/no-terminal guarantees as [`super::DetachedSpawn`]
/// without relying on creation flags.
#[derive(Debug, Default)]
pub struct SessionDetach;

impl Launcher for SessionDetach {
    fn daemonize(&self, execution: &Execution) -> Result<u32> {
        let mut command = daemon_command(execution)?;

        // Safety: only async-signal-safe calls between fork and exec.
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                libc::signal(libc::SIGHUP, libc::SIG_IGN);
                Ok(())
            });
        }

        spawn(command)
    }
}
