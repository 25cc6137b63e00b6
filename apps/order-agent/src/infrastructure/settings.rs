//! Settings adapter backed by the configuration file.
//!
//! The file is parsed again on every [`SettingsPort::load`], so edits to the
//! multipliers or the notification level apply from the next iteration.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::ports::{SettingsError, SettingsPort};
use crate::config::{ConfigError, load_config_from_string};
use crate::domain::strategy::DynamicSettings;

/// Re-reads dynamic settings from a YAML config file.
#[derive(Debug, Clone)]
pub struct ConfigFileSettings {
    path: PathBuf,
}

impl ConfigFileSettings {
    /// Settings read from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsPort for ConfigFileSettings {
    async fn load(&self) -> Result<DynamicSettings, SettingsError> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SettingsError::Unavailable {
                message: format!("{}: {e}", self.path.display()),
            })?;
        load_config_from_string(&contents)
            .and_then(|config| config.dynamic_settings())
            .map_err(|e| match e {
                ConfigError::ValidationError(message) => SettingsError::Invalid {
                    field: "config".to_string(),
                    message,
                },
                other => SettingsError::Unavailable {
                    message: other.to_string(),
                },
            })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::domain::strategy::NotifyLevel;

    fn config_file(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_reads_current_values() {
        let file = config_file("strategy:\n  take_profit: \"1.2\"\nnotifications:\n  level: errors\n");
        let settings = ConfigFileSettings::new(file.path());

        let loaded = settings.load().await.unwrap();

        assert_eq!(loaded.level, NotifyLevel::Errors);
        assert_eq!(loaded.take_profit.value(), dec!(1.2));
        assert_eq!(loaded.stop_loss.value(), dec!(0.95));
    }

    #[tokio::test]
    async fn test_picks_up_edits() {
        let file = config_file("notifications:\n  level: verbose\n");
        let settings = ConfigFileSettings::new(file.path());
        assert_eq!(settings.load().await.unwrap().level, NotifyLevel::Verbose);

        std::fs::write(file.path(), "notifications:\n  level: \"0\"\n").unwrap();

        assert_eq!(settings.load().await.unwrap().level, NotifyLevel::Off);
    }

    #[tokio::test]
    async fn test_invalid_value_is_reported() {
        let file = config_file("strategy:\n  stop_loss: \"-1\"\n");
        let settings = ConfigFileSettings::new(file.path());

        let err = settings.load().await.unwrap_err();

        assert!(matches!(err, SettingsError::Invalid { .. }));
        assert!(err.to_string().contains("stop_loss"));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let settings = ConfigFileSettings::new("/nonexistent/order-agent.yaml");

        let err = settings.load().await.unwrap_err();

        assert!(matches!(err, SettingsError::Unavailable { .. }));
    }
}
