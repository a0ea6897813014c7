//! Append-only workspace log.
//!
//! One line per event: `YYYY-MM-DD HH:MM:SS - <pid> - [LEVEL] message`.
//! The format is part of the workspace contract (the `logs` command and
//! external tooling tail this file), so it is fixed here rather than left to
//! a logging framework.

use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Appender for one workspace's `log.txt`.
///
/// Cheap to clone and safe to use from multiple threads: every append opens
/// the file in append mode, so the notify consumer and the worker's main
/// logic can share one logger without coordination.
#[derive(Debug, Clone)]
pub struct Logger {
    path: PathBuf,
}

impl Logger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one formatted line. Logging is best effort: a failed append is
    /// reported on stderr and otherwise ignored, so a full disk or a removed
    /// workspace never takes the worker down.
    pub fn log(&self, level: Level, message: &str) {
        let line = format!(
            "{} - {} - [{}] {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            std::process::id(),
            level,
            message
        );

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", line));

        if let Err(e) = result {
            eprintln!("warning: failed to append to '{}': {}", self.path.display(), e);
        }
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(Level::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn level_labels() {
        assert_eq!(Level::Info.to_string(), "INFO");
        assert_eq!(Level::Warning.to_string(), "WARNING");
        assert_eq!(Level::Error.to_string(), "ERROR");
    }

    #[test]
    fn appends_formatted_lines() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::new(temp_dir.path().join("log.txt"));

        logger.info("first");
        logger.error("second");

        let content = std::fs::read_to_string(temp_dir.path().join("log.txt")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] first"));
        assert!(lines[1].ends_with("[ERROR] second"));

        // ts - pid - [LEVEL] message
        let pid = std::process::id().to_string();
        let mut parts = lines[0].splitn(3, " - ");
        let ts = parts.next().unwrap();
        assert_eq!(ts.len(), "2026-01-01 00:00:00".len());
        assert_eq!(parts.next().unwrap(), pid);
    }

    #[test]
    fn failed_append_does_not_panic() {
        // Parent directory does not exist; append fails quietly.
        let logger = Logger::new(PathBuf::from("/nonexistent-vigil-dir/log.txt"));
        logger.info("dropped");
    }
}
