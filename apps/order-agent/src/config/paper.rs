//! Paper exchange seed data.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::market::{DEFAULT_PRICE_PRECISION, Market, STATUS_ONLINE};

/// Paper exchange configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaperConfig {
    /// Markets listed on the paper exchange.
    #[serde(default)]
    pub markets: Vec<PaperMarketConfig>,
}

/// One paper market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMarketConfig {
    /// Base currency.
    pub base: String,
    /// Quote currency.
    pub quote: String,
    /// Initial last trade price.
    pub ticker: Decimal,
    /// Decimal places for prices.
    #[serde(default = "default_precision")]
    pub precision: u32,
    /// Minimum order size.
    #[serde(default = "default_min_trade_size")]
    pub min_trade_size: Decimal,
}

impl PaperMarketConfig {
    /// V3 symbol of the market.
    #[must_use]
    pub fn symbol(&self) -> String {
        format!("{}-{}", self.base, self.quote).to_ascii_uppercase()
    }

    /// Market listing.
    #[must_use]
    pub fn market(&self) -> Market {
        Market {
            symbol: self.symbol(),
            base_currency_symbol: self.base.to_ascii_uppercase(),
            quote_currency_symbol: self.quote.to_ascii_uppercase(),
            min_trade_size: self.min_trade_size,
            precision: self.precision,
            status: STATUS_ONLINE.to_string(),
        }
    }
}

const fn default_precision() -> u32 {
    DEFAULT_PRICE_PRECISION
}

const fn default_min_trade_size() -> Decimal {
    dec!(0.0001)
}
