//! OS process-table primitives.
//!
//! The supervisor infers liveness of workers it does not control from two weak
//! signals: a persisted pid and the process table. This module is the narrow
//! interface to the latter: a lookup trait with a system-backed
//! implementation, plus the signal plumbing used to stop workers and to let a
//! worker observe its own interruption cooperatively.
//!
//! Status derivation code takes `&dyn ProcessProbe` so tests can drive the
//! full decision table without real processes.

use std::sync::atomic::{AtomicBool, Ordering};

/// What the process table reports for one pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInfo {
    /// The pid that was looked up.
    pub pid: u32,

    /// Whether the process is actually alive (a zombie is present in the
    /// table but not alive).
    pub alive: bool,
}

/// Narrow lookup interface over the OS process table.
pub trait ProcessProbe {
    /// Look up a process by pid. `None` means no such entry exists.
    fn find(&self, pid: u32) -> Option<ProcessInfo>;
}

/// The real process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

#[cfg(target_os = "linux")]
impl ProcessProbe for SystemProbe {
    fn find(&self, pid: u32) -> Option<ProcessInfo> {
        // /proc/<pid>/stat field 3 is the state character. It follows the
        // parenthesized command name, which may itself contain spaces and
        // parentheses, so scan from the last ')'.
        let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
        let after_comm = stat.rsplit_once(')').map(|(_, rest)| rest)?;
        let state = after_comm.split_whitespace().next()?.chars().next()?;
        Some(ProcessInfo {
            pid,
            alive: !matches!(state, 'Z' | 'X' | 'x'),
        })
    }
}

#[cfg(all(unix, not(target_os = "linux")))]
impl ProcessProbe for SystemProbe {
    fn find(&self, pid: u32) -> Option<ProcessInfo> {
        // kill(pid, 0) probes existence without delivering a signal.
        // EPERM still means the process exists. Without /proc there is no
        // cheap way to spot a zombie, so presence is reported as alive.
        let ret = unsafe { libc::kill(pid as libc::pid_t, 0) };
        if ret == 0 {
            return Some(ProcessInfo { pid, alive: true });
        }
        match std::io::Error::last_os_error().raw_os_error() {
            Some(libc::EPERM) => Some(ProcessInfo { pid, alive: true }),
            _ => None,
        }
    }
}

#[cfg(windows)]
impl ProcessProbe for SystemProbe {
    fn find(&self, pid: u32) -> Option<ProcessInfo> {
        // No /proc on Windows; ask tasklist for exactly this pid.
        let output = std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH", "/FO", "CSV"])
            .output()
            .ok()?;
        let text = String::from_utf8_lossy(&output.stdout);
        if text.contains(&format!("\"{}\"", pid)) {
            Some(ProcessInfo { pid, alive: true })
        } else {
            None
        }
    }
}

/// Send an interrupt (graceful stop) to a process.
#[cfg(unix)]
pub fn interrupt(pid: u32) -> std::io::Result<()> {
    signal(pid, libc::SIGINT)
}

/// Forcibly kill a process.
#[cfg(unix)]
pub fn kill(pid: u32) -> std::io::Result<()> {
    signal(pid, libc::SIGKILL)
}

#[cfg(unix)]
fn signal(pid: u32, sig: libc::c_int) -> std::io::Result<()> {
    let ret = unsafe { libc::kill(pid as libc::pid_t, sig) };
    if ret == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(windows)]
pub fn interrupt(pid: u32) -> std::io::Result<()> {
    taskkill(pid, false)
}

#[cfg(windows)]
pub fn kill(pid: u32) -> std::io::Result<()> {
    taskkill(pid, true)
}

#[cfg(windows)]
fn taskkill(pid: u32, force: bool) -> std::io::Result<()> {
    let mut cmd = std::process::Command::new("taskkill");
    cmd.args(["/PID", &pid.to_string()]);
    if force {
        cmd.arg("/F");
    }
    let status = cmd.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!(
            "taskkill exited with {:?}",
            status.code()
        )))
    }
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn record_interrupt(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install a SIGINT/SIGTERM handler that records the interrupt in a flag.
///
/// Workers poll [`interrupted`] from their main loop and exit once they reach
/// a safe state; the supervisor never enforces a shutdown deadline.
/// Installing twice is harmless.
#[cfg(unix)]
pub fn install_interrupt_flag() {
    unsafe {
        libc::signal(libc::SIGINT, record_interrupt as libc::sighandler_t);
        libc::signal(libc::SIGTERM, record_interrupt as libc::sighandler_t);
    }
}

/// On Windows the flag is only ever set by the process exiting; console
/// control handlers are not wired up.
#[cfg(windows)]
pub fn install_interrupt_flag() {}

/// Whether an interrupt has been observed by this process.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_own_process_alive() {
        let probe = SystemProbe;
        let me = std::process::id();
        let info = probe.find(me).expect("own process must be in the table");
        assert_eq!(info.pid, me);
        assert!(info.alive);
    }

    #[test]
    fn missing_pid_is_none() {
        let probe = SystemProbe;
        // Pid well above any default pid_max value.
        assert!(probe.find(99_999_999).is_none());
    }

    #[test]
    fn interrupt_flag_starts_clear() {
        assert!(!interrupted());
    }
}
