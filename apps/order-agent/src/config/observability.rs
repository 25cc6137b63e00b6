//! Observability configuration for logging and metrics.

use serde::{Deserialize, Serialize};

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Emit logs as JSON lines.
    #[serde(default)]
    pub json_logs: bool,
    /// Prometheus exporter address, e.g. `0.0.0.0:9100`. Disabled when unset.
    #[serde(default)]
    pub metrics_addr: Option<String>,
}
