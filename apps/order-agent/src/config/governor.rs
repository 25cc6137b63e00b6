//! Request governor settings.

use serde::{Deserialize, Serialize};

use crate::domain::rate_limit::{EndpointCallRecord, default_calls};

/// Governor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Endpoint table used when the session document is unreadable.
    #[serde(default = "default_calls")]
    pub calls: Vec<EndpointCallRecord>,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self { calls: default_calls() }
    }
}
