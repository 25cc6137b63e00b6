//! Start-up buy ladder.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::use_cases::LadderRequest;
use crate::domain::order_lifecycle::OrderType;
use crate::domain::strategy::BuyCall;

/// Buy ladder reconciled once at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Market name in the configured convention.
    pub market: String,
    /// Level prices.
    pub prices: Vec<Decimal>,
    /// Size per level.
    pub size: Decimal,
    /// Price factor applied to every level.
    #[serde(default = "default_deviation")]
    pub deviation: Decimal,
    /// Order type for every level.
    #[serde(default = "default_order_type")]
    pub order_type: OrderType,
    /// Cancel open buys that match no level.
    #[serde(default = "default_cancel")]
    pub cancel: bool,
}

impl LadderConfig {
    /// Validated ladder request.
    pub fn to_request(&self) -> Result<LadderRequest, ConfigError> {
        if self.prices.is_empty() {
            return Err(ConfigError::ValidationError("ladder.prices must not be empty".to_string()));
        }
        if self.prices.iter().any(|p| *p <= Decimal::ZERO) {
            return Err(ConfigError::ValidationError("ladder.prices must be positive".to_string()));
        }
        if self.size <= Decimal::ZERO {
            return Err(ConfigError::ValidationError("ladder.size must be positive".to_string()));
        }
        if self.deviation <= Decimal::ZERO {
            return Err(ConfigError::ValidationError("ladder.deviation must be positive".to_string()));
        }
        Ok(LadderRequest {
            market: self.market.clone(),
            calls: self.prices.iter().copied().map(BuyCall::new).collect(),
            size: self.size,
            deviation: self.deviation,
            kind: self.order_type,
            cancel: self.cancel,
        })
    }
}

const fn default_deviation() -> Decimal {
    Decimal::ONE
}

const fn default_order_type() -> OrderType {
    OrderType::Limit
}

const fn default_cancel() -> bool {
    true
}
