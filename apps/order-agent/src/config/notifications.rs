//! Notification settings.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::domain::strategy::NotifyLevel;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// `off`, `errors`, `default` or `verbose` (re-read every iteration).
    #[serde(default = "default_level")]
    pub level: String,
    /// Publish a social post for every fill.
    #[serde(default)]
    pub social: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            social: false,
        }
    }
}

impl NotificationsConfig {
    /// Parsed notification level.
    pub fn level(&self) -> Result<NotifyLevel, ConfigError> {
        self.level
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("notifications.level: {e}")))
    }
}

fn default_level() -> String {
    "default".to_string()
}
