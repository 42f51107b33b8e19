use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const NOTIFICATION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// Transient user-facing message ("toast")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Error,
        }
    }
}

/// Fan-out of notifications to whoever is listening
///
/// Publishing with no subscriber is not an error; the notification is
/// simply dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self { sender }
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, notification: Notification) {
        debug!(title = %notification.title, "notification");
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_notifications() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        notifier.publish(Notification::info("Command Executed", "Task t1 queued"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.title, "Command Executed");
        assert_eq!(received.severity, Severity::Info);
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        Notifier::new().publish(Notification::error("Execution Failed", "boom"));
    }
}
