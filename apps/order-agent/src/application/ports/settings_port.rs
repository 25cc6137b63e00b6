//! Settings Port (Driven Port)
//!
//! Source of the settings that may change while the agent runs.

use async_trait::async_trait;

use crate::domain::strategy::DynamicSettings;

/// Settings read error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    /// Settings source could not be read.
    #[error("Settings unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// A setting has an invalid value.
    #[error("Invalid setting {field}: {message}")]
    Invalid {
        /// Setting name.
        field: String,
        /// Error details.
        message: String,
    },
}

/// Port for reading dynamic settings.
#[async_trait]
pub trait SettingsPort: Send + Sync {
    /// Current settings.
    async fn load(&self) -> Result<DynamicSettings, SettingsError>;
}

/// Settings that never change.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSettings(pub DynamicSettings);

#[async_trait]
impl SettingsPort for FixedSettings {
    async fn load(&self) -> Result<DynamicSettings, SettingsError> {
        Ok(self.0)
    }
}
