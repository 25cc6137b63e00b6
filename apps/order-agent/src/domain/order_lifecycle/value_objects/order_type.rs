//! Order type (market, limit, ceiling variants).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type specifying execution behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - execute at best available price.
    Market,
    /// Limit order - execute at specified price or better.
    Limit,
    /// Spend up to a ceiling of quote currency at a limit.
    CeilingLimit,
    /// Spend up to a ceiling of quote currency at market.
    CeilingMarket,
}

impl OrderType {
    /// Returns true if this order type carries a limit price.
    #[must_use]
    pub const fn requires_limit_price(&self) -> bool {
        matches!(self, Self::Limit | Self::CeilingLimit)
    }

    /// Returns true if this is a market order (immediate execution).
    #[must_use]
    pub const fn is_market(&self) -> bool {
        matches!(self, Self::Market | Self::CeilingMarket)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::CeilingLimit => write!(f, "CEILING_LIMIT"),
            Self::CeilingMarket => write!(f, "CEILING_MARKET"),
        }
    }
}
