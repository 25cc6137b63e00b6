//! Market metadata.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{ApiVersion, DomainError, MarketPair};

/// Size precision used for every market.
pub const SIZE_PRECISION: u32 = 8;

/// Price precision assumed when a market is not known.
pub const DEFAULT_PRICE_PRECISION: u32 = 8;

/// Market status reported by the exchange for tradable markets.
pub const STATUS_ONLINE: &str = "ONLINE";

/// A tradable market as listed by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    /// V3 symbol (`BASE-QUOTE`).
    pub symbol: String,
    /// Base currency.
    pub base_currency_symbol: String,
    /// Quote currency.
    pub quote_currency_symbol: String,
    /// Minimum order size in base units.
    pub min_trade_size: Decimal,
    /// Decimal places allowed in prices.
    pub precision: u32,
    /// Raw status.
    pub status: String,
}

impl Market {
    /// True when the market accepts orders.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case(STATUS_ONLINE)
    }

    /// Base/quote pair.
    #[must_use]
    pub fn pair(&self) -> MarketPair {
        MarketPair::new(&self.base_currency_symbol, &self.quote_currency_symbol)
    }

    /// Symbol in the given API convention.
    #[must_use]
    pub fn name(&self, version: ApiVersion) -> String {
        self.pair().symbol(version)
    }

    /// True if `name` (in `version` convention) designates this market.
    pub fn matches(&self, name: &str, version: ApiVersion) -> Result<bool, DomainError> {
        Ok(MarketPair::parse(name, version)? == self.pair())
    }
}

/// 24h market statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    /// V3 symbol.
    pub symbol: String,
    /// Highest trade price.
    pub high: Decimal,
    /// Lowest trade price.
    pub low: Decimal,
    /// Traded volume in base units.
    pub volume: Decimal,
    /// Traded volume in quote units.
    pub quote_volume: Decimal,
}

/// Latest ticker prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker {
    /// Last trade price.
    pub last_trade_rate: Decimal,
    /// Best bid.
    pub bid_rate: Decimal,
    /// Best ask.
    pub ask_rate: Decimal,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rust_decimal_macros::dec;

    pub fn market(base: &str, quote: &str, precision: u32) -> Market {
        Market {
            symbol: format!("{base}-{quote}"),
            base_currency_symbol: base.to_string(),
            quote_currency_symbol: quote.to_string(),
            min_trade_size: dec!(0.01),
            precision,
            status: STATUS_ONLINE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::market;
    use super::*;

    #[test]
    fn online_is_case_insensitive() {
        let mut m = market("ETH", "BTC", 6);
        assert!(m.is_online());
        m.status = "offline".to_string();
        assert!(!m.is_online());
    }

    #[test]
    fn matches_either_convention() {
        let m = market("ETH", "BTC", 6);
        assert!(m.matches("BTC-ETH", ApiVersion::Legacy).unwrap());
        assert!(m.matches("eth-btc", ApiVersion::V3).unwrap());
        assert!(!m.matches("ETH-USD", ApiVersion::V3).unwrap());
    }
}
