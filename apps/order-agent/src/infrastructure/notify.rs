//! Notification adapters that write to the log.
//!
//! Push and social backends are external collaborators; these adapters keep
//! the agent's notifications visible in the structured log stream instead.

use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{Notification, NotifierPort, NotifyError, SocialPort};

/// Delivers notifications as INFO events on the `order_agent::notify` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotifierPort for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            target: "order_agent::notify",
            kind = ?notification.kind,
            title = %notification.title,
            body = %notification.body,
            "Notification"
        );
        Ok(())
    }
}

/// Publishes social posts as INFO events on the `order_agent::social` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSocial;

#[async_trait]
impl SocialPort for LogSocial {
    async fn post(&self, text: &str) -> Result<(), NotifyError> {
        if text.is_empty() {
            return Err(NotifyError::DeliveryFailed {
                message: "empty post".to_string(),
            });
        }
        info!(target: "order_agent::social", text = %text, "Post");
        Ok(())
    }
}
