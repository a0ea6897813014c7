//! Asynchronous, best-effort, multi-channel notification dispatch.
//!
//! `Notifier::send` enqueues a (title, body) pair and returns immediately; an
//! unbounded mpsc channel feeds a single background consumer thread. For each
//! message, in FIFO order, the consumer attempts delivery on every configured
//! channel independently (a channel failure is caught and logged, never
//! affecting the other channels or later messages) and then unconditionally
//! writes one log line recording the message.
//!
//! The producer never waits on delivery and there is no backpressure, so a
//! slow or failing channel must never stall the consumer either: every
//! channel implementation bounds its own delivery time (HTTP client timeout,
//! bounded child-process wait). There is no shutdown API; dropping the
//! `Notifier` closes the queue and joins the consumer, so messages enqueued
//! before the owner's natural teardown are still attempted and logged.
//!
//! A `Notifier` is an explicit instance threaded through the worker that owns
//! it, never a process-wide global.

mod desktop;
mod telegram;


pub use desktop::DesktopChannel;
pub use telegram::TelegramChannel;

use crate::workspace::Logger;
use std::sync::mpsc;
use std::thread;

/// One queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
}

/// A delivery target. Implementations must bound their own delivery time.
pub trait NotifyChannel: Send {
    /// Short channel name used in delivery-failure log lines.
    fn name(&self) -> &'static str;

    /// Attempt to deliver one message. Errors are reported as strings; they
    /// are logged by the consumer and never propagate further.
    fn deliver(&self, message: &NotificationMessage, origin: &str) -> Result<(), String>;
}

/// Handle for enqueueing notifications. Dropping it drains the queue.
pub struct Notifier {
    sender: Option<mpsc::Sender<NotificationMessage>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Notifier {
    /// Start the consumer thread over the given channels. Messages are also
    /// recorded through `logger` regardless of delivery outcome.
    pub fn new(logger: Logger, channels: Vec<Box<dyn NotifyChannel>>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || consume(receiver, logger, channels));
        Self {
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    /// Enqueue a message. Returns immediately; never blocks, even when every
    /// channel is down.
    pub fn send(&self, title: impl Into<String>, body: impl Into<String>) {
        // The send only fails if the consumer thread is gone, in which case
        // the owning process is already tearing down.
        if let Some(sender) = &self.sender {
            let _ = sender.send(NotificationMessage {
                title: title.into(),
                body: body.into(),
            });
        }
    }
}

impl Drop for Notifier {
    /// Close the queue and wait for the consumer to finish what was already
    /// enqueued. Without the join, a worker returning right after its final
    /// `send` could exit the process with the message undelivered and its
    /// mandatory log line unwritten.
    fn drop(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn consume(
    receiver: mpsc::Receiver<NotificationMessage>,
    logger: Logger,
    channels: Vec<Box<dyn NotifyChannel>>,
) {
    let origin = origin_string();

    for message in receiver {
        for channel in &channels {
            if let Err(e) = channel.deliver(&message, &origin) {
                logger.warn(&format!(
                    "notification delivery via {} failed: {}",
                    channel.name(),
                    e
                ));
            }
        }

        // The log line is the one guaranteed outcome of send().
        logger.info(&format!(
            "notification: {} | {}",
            message.title,
            message.body.replace('\n', " / ")
        ));
    }
}

/// `user@host`, attached to delivered messages so a push from one of several
/// machines identifies itself.
fn origin_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());
    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    format!("{}@{}", user, host)
}
