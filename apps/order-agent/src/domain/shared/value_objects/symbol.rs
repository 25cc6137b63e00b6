//! Market symbol encoding.
//!
//! The exchange has two generations of market naming:
//!
//! - **Legacy** (v1/v1.1): `QUOTE-BASE`, e.g. `BTC-ETH`
//! - **V3**: `BASE-QUOTE`, e.g. `ETH-BTC`
//!
//! Orders, tickers and conditional orders on the wire always use V3 symbols.
//! Configuration and notifications may use either, so every conversion goes
//! through [`MarketPair`], which is version independent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// API generation whose market naming convention a symbol follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiVersion {
    /// `QUOTE-BASE` ordering.
    #[default]
    Legacy,
    /// `BASE-QUOTE` ordering.
    V3,
}

impl ApiVersion {
    /// Token separating the two currencies.
    #[must_use]
    pub const fn separator(self) -> char {
        match self {
            Self::Legacy | Self::V3 => '-',
        }
    }

    /// Whether the base currency comes first.
    #[must_use]
    pub const fn base_first(self) -> bool {
        matches!(self, Self::V3)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::V3 => write!(f, "v3"),
        }
    }
}

/// A base/quote currency pair, independent of naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketPair {
    base: String,
    quote: String,
}

impl MarketPair {
    /// Create a pair. Currencies are normalized to uppercase.
    #[must_use]
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Parse a market symbol written in the given convention.
    pub fn parse(symbol: &str, version: ApiVersion) -> Result<Self, DomainError> {
        let mut parts = symbol.split(version.separator());
        let (Some(first), Some(second)) = (parts.next(), parts.next()) else {
            return Err(DomainError::UnparseableMarket {
                market: symbol.to_string(),
            });
        };
        if first.is_empty() || second.is_empty() {
            return Err(DomainError::UnparseableMarket {
                market: symbol.to_string(),
            });
        }
        if version.base_first() {
            Ok(Self::new(first, second))
        } else {
            Ok(Self::new(second, first))
        }
    }

    /// Format this pair in the given convention.
    #[must_use]
    pub fn symbol(&self, version: ApiVersion) -> String {
        let sep = version.separator();
        if version.base_first() {
            format!("{}{sep}{}", self.base, self.quote)
        } else {
            format!("{}{sep}{}", self.quote, self.base)
        }
    }

    /// Convert a symbol from one convention to another.
    pub fn convert(symbol: &str, from: ApiVersion, to: ApiVersion) -> Result<String, DomainError> {
        Ok(Self::parse(symbol, from)?.symbol(to))
    }

    /// Base currency (the asset being bought or sold).
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote currency (the asset prices are expressed in).
    #[must_use]
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Leveraged tokens are named `...BULL` / `...BEAR`.
    #[must_use]
    pub fn is_leveraged_token(&self) -> bool {
        is_leveraged_token(&self.base)
    }
}

impl fmt::Display for MarketPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// True for currency names longer than four characters ending in BULL or BEAR.
#[must_use]
pub fn is_leveraged_token(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.len() > 4 && (upper.ends_with("BULL") || upper.ends_with("BEAR"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn parse_v3_is_base_first() {
        let pair = MarketPair::parse("ETH-BTC", ApiVersion::V3).unwrap();
        assert_eq!(pair.base(), "ETH");
        assert_eq!(pair.quote(), "BTC");
    }

    #[test]
    fn parse_legacy_is_quote_first() {
        let pair = MarketPair::parse("BTC-ETH", ApiVersion::Legacy).unwrap();
        assert_eq!(pair.base(), "ETH");
        assert_eq!(pair.quote(), "BTC");
    }

    #[test]
    fn convert_legacy_to_v3() {
        let v3 = MarketPair::convert("usdt-btc", ApiVersion::Legacy, ApiVersion::V3).unwrap();
        assert_eq!(v3, "BTC-USDT");
    }

    #[test_case("BTC" ; "no separator")]
    #[test_case("-BTC" ; "empty first")]
    #[test_case("BTC-" ; "empty second")]
    #[test_case("" ; "empty")]
    fn parse_rejects_malformed(symbol: &str) {
        assert!(MarketPair::parse(symbol, ApiVersion::V3).is_err());
    }

    #[test]
    fn display_uses_slash() {
        assert_eq!(MarketPair::new("eth", "btc").to_string(), "ETH/BTC");
    }

    #[test_case("BTCBULL", true)]
    #[test_case("ethbear", true)]
    #[test_case("BULL", false)]
    #[test_case("BTC", false)]
    fn leveraged_tokens(name: &str, expected: bool) {
        assert_eq!(is_leveraged_token(name), expected);
    }

    #[test]
    fn pairs_compare_across_versions() {
        let a = MarketPair::parse("BTC-ETH", ApiVersion::Legacy).unwrap();
        let b = MarketPair::parse("ETH-BTC", ApiVersion::V3).unwrap();
        assert_eq!(a, b);
    }
}
