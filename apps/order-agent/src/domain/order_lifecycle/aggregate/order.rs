//! Order as reported by the exchange.
//!
//! Identity is the exchange order id. Two observations of the same order are
//! compared by id only; field deltas between polls are never interpreted.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::value_objects::{Direction, OrderSide, OrderType, TimeInForce};
use crate::domain::shared::{ApiVersion, DomainError, MarketPair, OrderId};

/// Fixed timestamp format used by the exchange, e.g. `2024-03-01T12:30:00.12Z`.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Parse a timestamp exactly as the exchange returns it.
pub fn parse_exchange_time(value: &str) -> Result<DateTime<Utc>, DomainError> {
    NaiveDateTime::parse_from_str(value, TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| DomainError::InvalidTimestamp {
            value: value.to_string(),
            message: e.to_string(),
        })
}

/// Format a timestamp the way the exchange does.
#[must_use]
pub fn format_exchange_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// An exchange order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Exchange-assigned identifier.
    pub id: OrderId,
    /// V3 market symbol (`BASE-QUOTE`).
    pub market_symbol: String,
    /// Raw direction.
    pub direction: Direction,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Ordered quantity.
    pub quantity: Decimal,
    /// Limit price, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    /// Time in force.
    pub time_in_force: TimeInForce,
    /// Quantity filled so far.
    #[serde(default)]
    pub fill_quantity: Decimal,
    /// Commission paid.
    #[serde(default)]
    pub commission: Decimal,
    /// Quote currency received or spent.
    #[serde(default)]
    pub proceeds: Decimal,
    /// Raw status (`OPEN`, `CLOSED`).
    pub status: String,
    /// Creation timestamp, exchange format.
    pub created_at: String,
    /// Close timestamp, exchange format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

impl Order {
    /// The side, if the direction is recognized.
    #[must_use]
    pub const fn side(&self) -> Option<OrderSide> {
        self.direction.side()
    }

    /// Price of the order: the limit price when one is set, otherwise the
    /// average fill price. Zero when neither is known (an unfilled market order).
    #[must_use]
    pub fn price(&self) -> Decimal {
        match self.limit {
            Some(limit) if limit > Decimal::ZERO => limit,
            _ if self.fill_quantity > Decimal::ZERO => self.proceeds / self.fill_quantity,
            _ => Decimal::ZERO,
        }
    }

    /// True for market-type orders (a triggered stop leg fills as one).
    #[must_use]
    pub const fn is_market(&self) -> bool {
        self.order_type.is_market()
    }

    /// Base/quote pair of the order's market.
    pub fn pair(&self) -> Result<MarketPair, DomainError> {
        MarketPair::parse(&self.market_symbol, ApiVersion::V3)
    }

    /// Market name in the given convention, falling back to the raw symbol.
    #[must_use]
    pub fn market_name(&self, version: ApiVersion) -> String {
        self.pair()
            .map_or_else(|_| self.market_symbol.clone(), |pair| pair.symbol(version))
    }

    /// Parsed creation time.
    pub fn created_time(&self) -> Result<DateTime<Utc>, DomainError> {
        parse_exchange_time(&self.created_at)
    }

    /// Parsed close time, if the order is closed.
    pub fn closed_time(&self) -> Result<Option<DateTime<Utc>>, DomainError> {
        self.closed_at.as_deref().map(parse_exchange_time).transpose()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use chrono::{Datelike, Timelike};
    use rust_decimal_macros::dec;

    #[test]
    fn price_prefers_limit() {
        let order = limit_order("1", OrderSide::Buy, dec!(10), dec!(100));
        assert_eq!(order.price(), dec!(100));
    }

    #[test]
    fn price_falls_back_to_average_fill() {
        let mut order = filled_order("1", OrderSide::Sell, dec!(4), dec!(25));
        order.limit = None;
        order.order_type = OrderType::Market;
        assert_eq!(order.price(), dec!(25));
    }

    #[test]
    fn price_is_zero_without_limit_or_fill() {
        let mut order = limit_order("1", OrderSide::Buy, dec!(4), dec!(25));
        order.limit = None;
        assert_eq!(order.price(), Decimal::ZERO);
    }

    #[test]
    fn parses_exchange_timestamps() {
        let at = parse_exchange_time("2024-03-01T12:30:05.12Z").unwrap();
        assert_eq!(at.year(), 2024);
        assert_eq!(at.hour(), 12);
        assert_eq!(at.second(), 5);
    }

    #[test]
    fn rejects_other_timestamp_formats() {
        assert!(parse_exchange_time("2024-03-01 12:30:05").is_err());
        assert!(parse_exchange_time("2024-03-01T12:30:05+00:00").is_err());
    }

    #[test]
    fn formatted_time_parses_back() {
        let at = parse_exchange_time("2024-03-01T12:30:05.120Z").unwrap();
        assert_eq!(parse_exchange_time(&format_exchange_time(at)).unwrap(), at);
    }

    #[test]
    fn market_name_converts_versions() {
        let order = limit_order("1", OrderSide::Buy, dec!(1), dec!(1));
        assert_eq!(order.market_name(ApiVersion::Legacy), "BTC-ETH");
        assert_eq!(order.market_name(ApiVersion::V3), "ETH-BTC");
    }

    #[test]
    fn deserializes_wire_order() {
        let json = r#"{
            "id": "abc",
            "marketSymbol": "ETH-BTC",
            "direction": "SELL",
            "type": "LIMIT",
            "quantity": "2.5",
            "limit": "0.05",
            "timeInForce": "GOOD_TIL_CANCELLED",
            "fillQuantity": "0",
            "commission": "0",
            "proceeds": "0",
            "status": "OPEN",
            "createdAt": "2024-03-01T12:30:05.12Z"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.side(), Some(OrderSide::Sell));
        assert_eq!(order.price(), dec!(0.05));
        assert!(order.closed_time().unwrap().is_none());
    }
}
