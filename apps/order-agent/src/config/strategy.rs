//! Strategy settings.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::use_cases::{DEFAULT_MAX_SELF_TRADE_RETRIES, StrategyConfig};
use crate::domain::shared::{ApiVersion, MarketPair};
use crate::domain::strategy::{HoldSet, Multiplier, StrategyKind};

/// Strategy configuration as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfigExternal {
    /// `standard` or `stop_loss`.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Take-profit multiplier (re-read every iteration).
    #[serde(default = "default_take_profit")]
    pub take_profit: Decimal,
    /// Stop-loss multiplier (re-read every iteration).
    #[serde(default = "default_stop_loss")]
    pub stop_loss: Decimal,
    /// Re-buy after a stop-loss fill.
    #[serde(default)]
    pub dca: bool,
    /// Markets that keep the profit as a base-asset reserve.
    #[serde(default)]
    pub hold: Vec<String>,
    /// Bound on the self-trade recovery loop.
    #[serde(default = "default_max_retries")]
    pub max_self_trade_retries: u32,
    /// Pause between loop iterations.
    #[serde(default)]
    pub poll_interval_secs: u64,
}

impl Default for StrategyConfigExternal {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            take_profit: default_take_profit(),
            stop_loss: default_stop_loss(),
            dca: false,
            hold: Vec::new(),
            max_self_trade_retries: default_max_retries(),
            poll_interval_secs: 0,
        }
    }
}

impl StrategyConfigExternal {
    /// Parsed take-profit multiplier.
    pub fn take_profit(&self) -> Result<Multiplier, ConfigError> {
        Multiplier::new(self.take_profit)
            .map_err(|e| ConfigError::ValidationError(format!("strategy.take_profit: {e}")))
    }

    /// Parsed stop-loss multiplier.
    pub fn stop_loss(&self) -> Result<Multiplier, ConfigError> {
        Multiplier::new(self.stop_loss)
            .map_err(|e| ConfigError::ValidationError(format!("strategy.stop_loss: {e}")))
    }

    /// Static strategy settings, with hold markets parsed in `version` convention.
    pub fn to_strategy(&self, version: ApiVersion) -> Result<StrategyConfig, ConfigError> {
        let kind: StrategyKind = self
            .kind
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("strategy.kind: {e}")))?;
        let hold = self
            .hold
            .iter()
            .map(|market| MarketPair::parse(market, version))
            .collect::<Result<HoldSet, _>>()
            .map_err(|e| ConfigError::ValidationError(format!("strategy.hold: {e}")))?;
        if self.max_self_trade_retries == 0 {
            return Err(ConfigError::ValidationError(
                "strategy.max_self_trade_retries must be positive".to_string(),
            ));
        }
        Ok(StrategyConfig {
            kind,
            dca: self.dca,
            hold,
            max_self_trade_retries: self.max_self_trade_retries,
        })
    }
}

fn default_kind() -> String {
    "standard".to_string()
}

const fn default_take_profit() -> Decimal {
    dec!(1.05)
}

const fn default_stop_loss() -> Decimal {
    dec!(0.95)
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_SELF_TRADE_RETRIES
}
