//! Notifier Ports (Driven Ports)
//!
//! Delivery backends for user notifications and social posts. The engine
//! decides whether and what to send; these ports only deliver.

use async_trait::async_trait;

use crate::domain::strategy::MessageKind;

/// Notification delivery error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    /// Backend rejected or failed to deliver.
    #[error("Notification delivery failed: {message}")]
    DeliveryFailed {
        /// Error details.
        message: String,
    },
}

/// How often an identical notification may be repeated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// Every time.
    #[default]
    Always,
    /// At most once per minute per title.
    OncePerMinute,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short title, e.g. `Bittrex - Done SELL +5.00%`.
    pub title: String,
    /// Body text, typically the order as JSON.
    pub body: String,
    /// Message kind, used for verbosity gating.
    pub kind: MessageKind,
    /// Repeat policy.
    pub frequency: Frequency,
}

impl Notification {
    /// Notification sent every time.
    #[must_use]
    pub fn new(kind: MessageKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            frequency: Frequency::Always,
        }
    }

    /// Set the repeat policy.
    #[must_use]
    pub const fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }
}

/// Port for notification delivery.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    /// Deliver a notification.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Port for short public posts about fills.
#[async_trait]
pub trait SocialPort: Send + Sync {
    /// Publish a post.
    async fn post(&self, text: &str) -> Result<(), NotifyError>;
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl NotifierPort for NoOpNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[async_trait]
impl SocialPort for NoOpNotifier {
    async fn post(&self, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_op_notifier_succeeds() {
        let notifier = NoOpNotifier;
        let n = Notification::new(MessageKind::Info, "t", "b").with_frequency(Frequency::OncePerMinute);
        assert!(notifier.send(&n).await.is_ok());
        assert!(notifier.post("hello").await.is_ok());
        assert_eq!(n.frequency, Frequency::OncePerMinute);
    }
}
