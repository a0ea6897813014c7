//! Pid-claim serialization.
//!
//! `set_pid` is a check-then-write pair: read the current status, then
//! overwrite the pid file. Two launchers racing on the same name could both
//! observe `stopped` and both write, the last one silently winning. The claim
//! lock closes that window: a transient `__pid__.lock` created with
//! `create_new` semantics is held across the check and the write, so exactly
//! one claimant at a time evaluates the status.
//!
//! A lock left behind by a crashed claimant is broken automatically when the
//! pid it records is no longer alive.

use crate::error::{Result, VigilError};
use crate::proc::{ProcessProbe, SystemProbe};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Metadata written into the claim lock file, for diagnostics and for
/// stale-lock detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Who created the lock (`user@host`).
    pub owner: String,

    /// Pid of the claiming process.
    pub pid: u32,

    /// When the lock was created.
    pub created_at: DateTime<Utc>,
}

impl ClaimMetadata {
    fn current() -> Self {
        Self {
            owner: owner_string(),
            pid: std::process::id(),
            created_at: Utc::now(),
        }
    }
}

/// RAII guard for a held claim lock; removes the lock file on drop.
#[derive(Debug)]
pub struct ClaimGuard {
    path: PathBuf,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Acquire the claim lock for an execution.
///
/// Fails with `AlreadyRunning` when another claim is in flight: at the moment
/// of the call a concurrent claimant is the owner-in-progress of the name.
/// A lock whose recorded claimant is dead is broken and retried once.
pub fn acquire(lock_path: &Path, execution_name: &str) -> Result<ClaimGuard> {
    match try_create(lock_path)? {
        true => Ok(ClaimGuard {
            path: lock_path.to_path_buf(),
        }),
        false => {
            if is_stale(lock_path) {
                let _ = fs::remove_file(lock_path);
                if try_create(lock_path)? {
                    return Ok(ClaimGuard {
                        path: lock_path.to_path_buf(),
                    });
                }
            }
            Err(VigilError::AlreadyRunning(execution_name.to_string()))
        }
    }
}

/// Try to create the lock file exclusively. `Ok(false)` means it exists.
fn try_create(lock_path: &Path) -> Result<bool> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(lock_path);

    let mut file = match file {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => {
            return Err(VigilError::UserError(format!(
                "failed to create claim lock '{}': {}",
                lock_path.display(),
                e
            )));
        }
    };

    let metadata = ClaimMetadata::current();
    let json = serde_json::to_string(&metadata)
        .map_err(|e| VigilError::UserError(format!("failed to serialize claim lock: {}", e)))?;

    file.write_all(json.as_bytes()).map_err(|e| {
        let _ = fs::remove_file(lock_path);
        VigilError::UserError(format!("failed to write claim lock: {}", e))
    })?;

    Ok(true)
}

/// A lock is stale when its metadata is unreadable or its claimant is gone.
fn is_stale(lock_path: &Path) -> bool {
    let content = match fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => return true,
    };
    let metadata: ClaimMetadata = match serde_json::from_str(&content) {
        Ok(metadata) => metadata,
        Err(_) => return true,
    };
    SystemProbe.find(metadata.pid).is_none_or(|info| !info.alive)
}

fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_and_drop_removes() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("__pid__.lock");

        let guard = acquire(&lock_path, "cu-box").unwrap();
        assert!(lock_path.exists());

        let metadata: ClaimMetadata =
            serde_json::from_str(&fs::read_to_string(&lock_path).unwrap()).unwrap();
        assert_eq!(metadata.pid, std::process::id());
        assert!(metadata.owner.contains('@'));

        drop(guard);
        assert!(!lock_path.exists());
    }

    #[test]
    fn held_lock_reports_already_running() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("__pid__.lock");

        // Held by this (live) process.
        let _guard = acquire(&lock_path, "cu-box").unwrap();

        let err = acquire(&lock_path, "cu-box").unwrap_err();
        assert!(matches!(err, VigilError::AlreadyRunning(ref name) if name == "cu-box"));
    }

    #[test]
    fn stale_lock_with_dead_claimant_is_broken() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("__pid__.lock");

        let metadata = ClaimMetadata {
            owner: "ghost@nowhere".to_string(),
            pid: 99_999_999,
            created_at: Utc::now(),
        };
        fs::write(&lock_path, serde_json::to_string(&metadata).unwrap()).unwrap();

        // The dead claimant's lock must not block a new claim.
        let guard = acquire(&lock_path, "cu-box").unwrap();
        drop(guard);
        assert!(!lock_path.exists());
    }

    #[test]
    fn unreadable_lock_is_broken() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("__pid__.lock");
        fs::write(&lock_path, "garbage").unwrap();

        assert!(acquire(&lock_path, "cu-box").is_ok());
    }
}
