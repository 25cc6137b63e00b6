//! Exchange Port (Driven Port)
//!
//! The narrow set of exchange operations the trading engine needs. The live
//! REST client, the paper exchange and test doubles all satisfy it.

use async_trait::async_trait;

use crate::domain::market::{Market, MarketSummary, OrderBook, Ticker};
use crate::domain::order_lifecycle::{ConditionalOrder, NewConditionalOrder, NewOrder, Order};
use crate::domain::shared::{ConditionalOrderId, OrderId};

/// Which orders a listing covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrderScope {
    /// Every market.
    All,
    /// One market, by V3 symbol.
    Market(String),
}

impl OrderScope {
    /// Query suffix for request paths.
    #[must_use]
    pub fn query(&self) -> String {
        match self {
            Self::All => String::new(),
            Self::Market(symbol) => format!("?marketSymbol={symbol}"),
        }
    }

    /// True if an order in `symbol` falls within this scope.
    #[must_use]
    pub fn covers(&self, symbol: &str) -> bool {
        match self {
            Self::All => true,
            Self::Market(scope) => scope.eq_ignore_ascii_case(symbol),
        }
    }
}

/// Exchange error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// Network or HTTP failure.
    #[error("Exchange transport error: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// Exchange-reported failure without special handling.
    #[error("Exchange error {code}: {message}")]
    Api {
        /// Exchange error code.
        code: String,
        /// Error details.
        message: String,
    },

    /// The call exceeded the account's rate limit.
    #[error("Rate limited by exchange: {message}")]
    RateLimited {
        /// Error details.
        message: String,
    },

    /// The order would have matched one of the account's own orders.
    #[error("Order would self-trade: {message}")]
    SelfTrade {
        /// Error details.
        message: String,
    },

    /// The order is smaller than the market minimum.
    #[error("Minimum trade requirement not met: {message}")]
    MinTradeRequirementNotMet {
        /// Error details.
        message: String,
    },

    /// The market does not exist or is not listed.
    #[error("Unknown market: {market}")]
    UnknownMarket {
        /// Market symbol.
        market: String,
    },

    /// The order a conditional order should cancel is no longer open.
    #[error("Invalid order to cancel: {message}")]
    InvalidCancelOrder {
        /// Error details.
        message: String,
    },

    /// The referenced order does not exist.
    #[error("Order not found: {id}")]
    NotFound {
        /// Order id.
        id: String,
    },

    /// The request governor could not admit the call.
    #[error("Request governor failed: {message}")]
    Governor {
        /// Error details.
        message: String,
    },
}

impl ExchangeError {
    /// Classify an exchange error code.
    #[must_use]
    pub fn from_api_code(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let upper = code.to_ascii_uppercase();
        match upper.as_str() {
            "TOO_MANY_REQUESTS" | "RATE_LIMIT_EXCEEDED" | "THROTTLED" => Self::RateLimited { message },
            "MIN_TRADE_REQUIREMENT_NOT_MET" => Self::MinTradeRequirementNotMet { message },
            "MARKET_DOES_NOT_EXIST" | "INVALID_MARKET" | "MARKET_OFFLINE" => Self::UnknownMarket { market: message },
            "INVALID_CANCEL_ORDER" => Self::InvalidCancelOrder { message },
            "NOT_FOUND" | "ORDER_NOT_OPEN" => Self::NotFound { id: message },
            _ if upper.contains("SELF_TRADE") => Self::SelfTrade { message },
            _ => Self::Api { code: upper, message },
        }
    }

    /// True for rate-limit rejections.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// True for self-trade rejections.
    #[must_use]
    pub const fn is_self_trade(&self) -> bool {
        matches!(self, Self::SelfTrade { .. })
    }
}

/// Port for exchange interactions.
#[async_trait]
pub trait ExchangePort: Send + Sync {
    /// All listed markets, online or not.
    async fn markets(&self) -> Result<Vec<Market>, ExchangeError>;

    /// Latest ticker for a V3 symbol.
    async fn ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError>;

    /// 24h statistics for a V3 symbol.
    async fn market_summary(&self, symbol: &str) -> Result<MarketSummary, ExchangeError>;

    /// Order book for a V3 symbol.
    async fn order_book(&self, symbol: &str, depth: u32) -> Result<OrderBook, ExchangeError>;

    /// Currently open orders.
    async fn open_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError>;

    /// Closed-order history, most recent first.
    async fn order_history(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError>;

    /// Place an order.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, ExchangeError>;

    /// Cancel an order.
    async fn cancel_order(&self, id: &OrderId) -> Result<(), ExchangeError>;

    /// Open conditional orders in a V3 symbol.
    async fn open_conditional_orders(&self, symbol: &str) -> Result<Vec<ConditionalOrder>, ExchangeError>;

    /// Place a conditional order.
    async fn create_conditional_order(
        &self,
        order: &NewConditionalOrder,
    ) -> Result<ConditionalOrder, ExchangeError>;

    /// Cancel a conditional order.
    async fn cancel_conditional_order(&self, id: &ConditionalOrderId) -> Result<(), ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("TOO_MANY_REQUESTS", true)]
    #[test_case("too_many_requests", true)]
    #[test_case("INSUFFICIENT_FUNDS", false)]
    fn classifies_rate_limits(code: &str, expected: bool) {
        assert_eq!(ExchangeError::from_api_code(code, "x").is_rate_limited(), expected);
    }

    #[test]
    fn classifies_recoverable_codes() {
        assert!(ExchangeError::from_api_code("ORDER_WOULD_SELF_TRADE", "x").is_self_trade());
        assert!(matches!(
            ExchangeError::from_api_code("MIN_TRADE_REQUIREMENT_NOT_MET", "x"),
            ExchangeError::MinTradeRequirementNotMet { .. }
        ));
        assert!(matches!(
            ExchangeError::from_api_code("INVALID_CANCEL_ORDER", "x"),
            ExchangeError::InvalidCancelOrder { .. }
        ));
        assert!(matches!(
            ExchangeError::from_api_code("MARKET_DOES_NOT_EXIST", "FOO-BAR"),
            ExchangeError::UnknownMarket { .. }
        ));
    }

    #[test]
    fn unknown_code_keeps_code() {
        let err = ExchangeError::from_api_code("insufficient_funds", "no money");
        assert_eq!(
            err,
            ExchangeError::Api {
                code: "INSUFFICIENT_FUNDS".to_string(),
                message: "no money".to_string()
            }
        );
    }

    #[test]
    fn scope_query_and_cover() {
        let scope = OrderScope::Market("ETH-BTC".to_string());
        assert_eq!(scope.query(), "?marketSymbol=ETH-BTC");
        assert!(scope.covers("eth-btc"));
        assert!(!scope.covers("LTC-BTC"));
        assert!(OrderScope::All.covers("anything"));
        assert!(OrderScope::All.query().is_empty());
    }
}
