//! Log viewing: bounded tail plus polling follow.

use crate::error::{Result, VigilError};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

/// How many trailing lines the `logs` command shows before following.
pub const TAIL_LINES: usize = 100;

/// Polling interval while following a file.
const FOLLOW_INTERVAL: Duration = Duration::from_millis(500);

/// The last `count` lines of `path`. A missing file is an error; the caller
/// named it explicitly.
pub fn tail(path: &Path, count: usize) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| VigilError::UserError(format!("failed to read '{}': {}", path.display(), e)))?;

    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    Ok(lines[start..].iter().map(|s| s.to_string()).collect())
}

/// Print everything appended to `path` from now on, polling twice a second.
/// Runs until the process is interrupted. A shrinking file is treated as
/// truncated and re-read from the start.
pub fn follow(path: &Path) -> Result<()> {
    let mut offset = std::fs::metadata(path)
        .map_err(|e| VigilError::UserError(format!("failed to stat '{}': {}", path.display(), e)))?
        .len();

    loop {
        std::thread::sleep(FOLLOW_INTERVAL);

        // The file may be swapped or briefly absent during an atomic rewrite.
        let len = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => continue,
        };
        if len < offset {
            offset = 0;
        }
        if len == offset {
            continue;
        }

        let mut file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(_) => continue,
        };
        if file.seek(SeekFrom::Start(offset)).is_err() {
            continue;
        }
        let mut fresh = String::new();
        if file.read_to_string(&mut fresh).is_err() {
            continue;
        }
        offset = len;
        print!("{}", fresh);
    }
}
