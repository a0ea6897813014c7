//! Vigil: lightweight supervisor for independently named, long-running
//! worker processes.
//!
//! This binary embeds the supervisor core around a small heartbeat worker: a
//! loop that appends a `beat` record at a configurable interval until it is
//! interrupted. It exists to exercise every part of the lifecycle (create,
//! configure, start in the foreground or daemonized, stop, logs, remove)
//! with a worker whose behavior is trivial to observe.

mod cli;
pub mod error;
pub mod execution;
pub mod exit_codes;
pub mod fs;
pub mod launcher;
pub mod notify;
pub mod proc;
pub mod supervisor;
pub mod workspace;

use cli::Cli;
use error::{Result, VigilError};
use execution::{ConfigDoc, Execution};
use notify::{DesktopChannel, Notifier, NotifyChannel, TelegramChannel};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use supervisor::Supervisor;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let supervisor = Supervisor::new(app_home()?, Box::new(heartbeat))?
        .with_default_config(default_config());
    supervisor.dispatch(cli.command)
}

/// Home directory for the heartbeat application: `$VIGIL_HOME` when set,
/// `~/.vigil/heartbeat` otherwise.
fn app_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("VIGIL_HOME") {
        return Ok(PathBuf::from(home));
    }
    let user_home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| {
            VigilError::UserError("cannot locate a home directory; set VIGIL_HOME".to_string())
        })?;
    Ok(PathBuf::from(user_home).join(".vigil").join("heartbeat"))
}

/// Template new executions are seeded from. The notification keys are empty
/// by default; filling them in enables the corresponding channel.
fn default_config() -> ConfigDoc {
    let mut doc = ConfigDoc::new();
    doc.insert("interval.secs".to_string(), json!(60));
    doc.insert("telegram.bot".to_string(), json!(""));
    doc.insert("telegram.chat".to_string(), json!(""));
    doc.insert("desktop.notification".to_string(), json!(false));
    doc
}

/// The demo worker: beat, sleep, repeat, until interrupted.
fn heartbeat(execution: &Execution) -> anyhow::Result<()> {
    proc::install_interrupt_flag();

    let logger = execution.logger();
    let config = execution.read_config()?.unwrap_or_default();
    let interval = config
        .get("interval.secs")
        .and_then(|v| v.as_u64())
        .unwrap_or(60);

    let notifier = build_notifier(execution, &config);
    let records = execution.records();

    if records.count("status")? == 0 {
        records.append(
            "status",
            json!({ "interval_secs": interval, "pid": std::process::id() }),
        )?;
        notifier.send("<heartbeat started>", format!("interval: {}s", interval));
    }

    logger.info(&format!("Worker loop entered (interval {}s)", interval));
    while !proc::interrupted() {
        records.append("beat", json!({ "pid": std::process::id() }))?;
        sleep_until_interrupt(Duration::from_secs(interval));
    }

    logger.info("Interrupt observed; exiting at a safe point");
    notifier.send("<heartbeat stopped>", "clean shutdown");
    Ok(())
}

/// Channels as configured. A channel that fails to construct is skipped with
/// a warning; the notifier itself always exists so the log line contract
/// holds even with zero channels.
fn build_notifier(execution: &Execution, config: &ConfigDoc) -> Notifier {
    let logger = execution.logger();
    let mut channels: Vec<Box<dyn NotifyChannel>> = Vec::new();

    let bot = config
        .get("telegram.bot")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    if !bot.is_empty() {
        let chat = config
            .get("telegram.chat")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        match TelegramChannel::new(bot, chat) {
            Ok(channel) => channels.push(Box::new(channel)),
            Err(e) => logger.warn(&format!("telegram channel disabled: {}", e)),
        }
    }

    if config
        .get("desktop.notification")
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
    {
        channels.push(Box::new(DesktopChannel));
    }

    Notifier::new(logger, channels)
}

/// Sleep for `duration` in short slices so an interrupt cuts the wait close
/// to immediately instead of after a full interval.
fn sleep_until_interrupt(duration: Duration) {
    const SLICE: Duration = Duration::from_millis(500);

    let mut remaining = duration;
    while !proc::interrupted() && remaining > Duration::ZERO {
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn app_home_honors_the_override() {
        unsafe { std::env::set_var("VIGIL_HOME", "/tmp/vigil-test-home") };
        let home = app_home().unwrap();
        unsafe { std::env::remove_var("VIGIL_HOME") };
        assert_eq!(home, PathBuf::from("/tmp/vigil-test-home"));
    }

    #[test]
    #[serial]
    fn app_home_defaults_under_the_user_home() {
        unsafe { std::env::remove_var("VIGIL_HOME") };
        let home = app_home().unwrap();
        assert!(home.ends_with(".vigil/heartbeat"));
    }

    #[test]
    fn default_config_carries_the_notification_keys() {
        let doc = default_config();
        assert_eq!(doc.get("interval.secs"), Some(&json!(60)));
        assert_eq!(doc.get("telegram.bot"), Some(&json!("")));
        assert_eq!(doc.get("telegram.chat"), Some(&json!("")));
        assert_eq!(doc.get("desktop.notification"), Some(&json!(false)));
    }

    #[test]
    fn empty_config_enables_no_channels() {
        // Construction must not fail with zero channels; the notifier still
        // owns the log-line contract.
        let temp_dir = tempfile::TempDir::new().unwrap();
        let execution = Execution::new(temp_dir.path().join("cu-box"));
        execution.init().unwrap();

        let _notifier = build_notifier(&execution, &default_config());
    }
}
