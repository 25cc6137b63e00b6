//! Notification service.
//!
//! Applies verbosity gating and the once-per-minute repeat policy in front of
//! the delivery ports. Delivery failures are logged and never propagate.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::error;

use crate::application::ports::{Clock, Frequency, Notification, NotifierPort, SocialPort};
use crate::domain::strategy::{MessageKind, NotifyLevel};

/// Window of the once-per-minute policy.
const THROTTLE_WINDOW_SECS: i64 = 60;

/// Gated, throttled notification front end.
pub struct Notifier {
    backend: Arc<dyn NotifierPort>,
    social: Option<Arc<dyn SocialPort>>,
    clock: Arc<dyn Clock>,
    exchange_name: String,
    recent: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Notifier {
    /// Create a notifier. Titles are prefixed with `exchange_name`.
    pub fn new(backend: Arc<dyn NotifierPort>, clock: Arc<dyn Clock>, exchange_name: impl Into<String>) -> Self {
        Self {
            backend,
            social: None,
            clock,
            exchange_name: exchange_name.into(),
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Enable social posts on fills.
    #[must_use]
    pub fn with_social(mut self, social: Arc<dyn SocialPort>) -> Self {
        self.social = Some(social);
        self
    }

    /// Exchange display name.
    #[must_use]
    pub fn exchange_name(&self) -> &str {
        &self.exchange_name
    }

    /// Title in the `<Exchange> - <suffix>` form.
    #[must_use]
    pub fn title(&self, suffix: &str) -> String {
        format!("{} - {suffix}", self.exchange_name)
    }

    /// Send if `level` admits the notification's kind.
    pub async fn notify(&self, level: NotifyLevel, notification: Notification) {
        if level.can_send(notification.kind) {
            self.deliver(notification).await;
        }
    }

    /// Send regardless of level, subject to the repeat policy.
    pub async fn deliver(&self, notification: Notification) {
        if notification.frequency == Frequency::OncePerMinute && !self.admit(&notification.title) {
            return;
        }
        if let Err(e) = self.backend.send(&notification).await {
            error!(title = %notification.title, error = %e, "Failed to send notification");
        }
    }

    fn admit(&self, title: &str) -> bool {
        let now = self.clock.now();
        let mut recent = self.recent.lock();
        if let Some(sent) = recent.get(title)
            && now - *sent < Duration::seconds(THROTTLE_WINDOW_SECS)
        {
            return false;
        }
        recent.insert(title.to_string(), now);
        true
    }

    /// Publish a social post, if enabled.
    pub async fn post(&self, text: &str) {
        if let Some(social) = &self.social
            && let Err(e) = social.post(text).await
        {
            error!(error = %e, "Failed to publish post");
        }
    }

    /// Log an error and notify it at most once per minute.
    pub async fn report_error(&self, level: NotifyLevel, err: &(dyn StdError + 'static)) {
        let message = error_chain(err);
        error!(error = %message, "Trading loop error");
        let notification = Notification::new(MessageKind::Error, self.title("ERROR"), message)
            .with_frequency(Frequency::OncePerMinute);
        self.notify(level, notification).await;
    }
}

/// `outer: inner: root` rendering of an error and its sources.
#[must_use]
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        let text = inner.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = inner.source();
    }
    message
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use crate::application::ports::NotifyError;
    use async_trait::async_trait;

    /// Notifier backend that records everything it is asked to send.
    #[derive(Default)]
    pub struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        posts: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().clone()
        }

        pub fn titles(&self) -> Vec<String> {
            self.sent.lock().iter().map(|n| n.title.clone()).collect()
        }

        pub fn posts(&self) -> Vec<String> {
            self.posts.lock().clone()
        }
    }

    #[async_trait]
    impl NotifierPort for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().push(notification.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl SocialPort for RecordingNotifier {
        async fn post(&self, text: &str) -> Result<(), NotifyError> {
            self.posts.lock().push(text.to_string());
            Ok(())
        }
    }
}
