//! Stale-order sweeper settings.

use serde::{Deserialize, Serialize};

use crate::application::services::DEFAULT_SWEEP_INTERVAL_SECS;
use crate::application::use_cases::DEFAULT_MAX_ORDER_AGE_DAYS;

/// Sweeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Seconds between sweeps.
    #[serde(default = "default_interval")]
    pub interval_secs: i64,
    /// Orders at least this old are reopened.
    #[serde(default = "default_max_age")]
    pub max_order_age_days: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_order_age_days: default_max_age(),
        }
    }
}

const fn default_interval() -> i64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

const fn default_max_age() -> i64 {
    DEFAULT_MAX_ORDER_AGE_DAYS
}
