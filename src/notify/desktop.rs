//! Desktop push delivery channel.
//!
//! Delegates to the platform's notification command (`notify-send` on Linux,
//! `osascript` on macOS) as a child process. The wait on the child is
//! bounded: a notification daemon that never answers gets the child killed
//! rather than wedging the notify consumer.

use super::{NotificationMessage, NotifyChannel};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const CHILD_WAIT: Duration = Duration::from_secs(5);

/// Desktop notification via the platform's push command.
#[derive(Debug, Default)]
pub struct DesktopChannel;

impl NotifyChannel for DesktopChannel {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn deliver(&self, message: &NotificationMessage, _origin: &str) -> Result<(), String> {
        let mut command = push_command(message);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let mut child = command
            .spawn()
            .map_err(|e| format!("failed to spawn push command: {}", e))?;

        let deadline = Instant::now() + CHILD_WAIT;
        loop {
            match child.try_wait() {
                Ok(Some(status)) if status.success() => return Ok(()),
                Ok(Some(status)) => {
                    return Err(format!("push command exited with {:?}", status.code()));
                }
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err("push command timed out".to_string());
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(50)),
                Err(e) => return Err(format!("failed to wait for push command: {}", e)),
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn push_command(message: &NotificationMessage) -> Command {
    let mut command = Command::new("notify-send");
    command.arg(&message.title).arg(&message.body);
    command
}

#[cfg(target_os = "macos")]
fn push_command(message: &NotificationMessage) -> Command {
    let mut command = Command::new("osascript");
    command.arg("-e").arg(format!(
        "display notification \"{}\" with title \"{}\"",
        message.body.replace('"', "\\\""),
        message.title.replace('"', "\\\"")
    ));
    command
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn push_command(message: &NotificationMessage) -> Command {
    // No portable push command elsewhere; msg.exe covers Windows sessions.
    let mut command = Command::new("msg");
    command
        .arg("*")
        .arg(format!("{}: {}", message.title, message.body));
    command
}
