//! Exchange connection settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::shared::ApiVersion;

/// Exchange configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Display name, used in notification titles and session file names.
    #[serde(default = "default_exchange_name")]
    pub name: String,
    /// Naming convention of market names in this configuration.
    #[serde(default)]
    pub api_version: ApiVersion,
    /// Directory holding the governor's session files.
    #[serde(default = "default_session_dir")]
    pub session_dir: PathBuf,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: default_exchange_name(),
            api_version: ApiVersion::default(),
            session_dir: default_session_dir(),
        }
    }
}

fn default_exchange_name() -> String {
    "Bittrex".to_string()
}

fn default_session_dir() -> PathBuf {
    PathBuf::from(".order-agent")
}
