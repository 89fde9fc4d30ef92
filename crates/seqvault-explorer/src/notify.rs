//! User-visible notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Tracing target for notifications.
const TRACING_TARGET: &str = "seqvault_explorer::notify";

/// Severity of a [`Notification`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A message shown to the person browsing the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Creates an informational notification.
    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, title, message)
    }

    /// Creates a warning notification.
    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Warning, title, message)
    }

    /// Creates an error notification.
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, message)
    }

    fn new(level: NotificationLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.title, self.message)
    }
}

/// Receives notifications raised by the file tree.
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let Notification {
            level,
            title,
            message,
        } = notification;

        match level {
            NotificationLevel::Info => {
                tracing::info!(target: TRACING_TARGET, %title, %message, "Notification")
            }
            NotificationLevel::Warning => {
                tracing::warn!(target: TRACING_TARGET, %title, %message, "Notification")
            }
            NotificationLevel::Error => {
                tracing::error!(target: TRACING_TARGET, %title, %message, "Notification")
            }
        }
    }
}

/// Forwards notifications to a channel, e.g. for a UI event loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier and the receiving end of its channel.
    pub fn new() -> (Self, UnboundedReceiver<Notification>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::debug!(
                target: TRACING_TARGET,
                "Notification dropped, receiver is closed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_delivers_in_order() {
        let (notifier, mut receiver) = ChannelNotifier::new();
        notifier.notify(Notification::info("Loaded", "3 folders"));
        notifier.notify(Notification::error("Failed", "boom"));

        assert_eq!(receiver.try_recv().unwrap().level, NotificationLevel::Info);
        assert_eq!(receiver.try_recv().unwrap().title, "Failed");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (notifier, receiver) = ChannelNotifier::new();
        drop(receiver);
        notifier.notify(Notification::warning("Ignored", "nobody listens"));
    }

    #[test]
    fn display() {
        let notification = Notification::error("Failed to open folder", "timeout");
        assert_eq!(
            notification.to_string(),
            "[error] Failed to open folder: timeout"
        );
    }
}
