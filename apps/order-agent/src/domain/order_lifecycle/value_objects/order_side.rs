//! Order side (buy or sell) and the raw direction reported by the exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an order as reported by the exchange.
///
/// Anything other than the two known markers is kept verbatim in
/// [`Direction::Unrecognized`] and never coerced into a side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    /// Known side.
    Known(OrderSide),
    /// Unrecognized direction marker.
    Unrecognized(String),
}

impl Direction {
    /// The side, if the direction is recognized.
    #[must_use]
    pub const fn side(&self) -> Option<OrderSide> {
        match self {
            Self::Known(side) => Some(*side),
            Self::Unrecognized(_) => None,
        }
    }

    /// True if this is the given side.
    #[must_use]
    pub fn is(&self, side: OrderSide) -> bool {
        self.side() == Some(side)
    }
}

impl From<OrderSide> for Direction {
    fn from(side: OrderSide) -> Self {
        Self::Known(side)
    }
}

impl From<String> for Direction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "BUY" => Self::Known(OrderSide::Buy),
            "SELL" => Self::Known(OrderSide::Sell),
            _ => Self::Unrecognized(value),
        }
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Known(side) => side.as_str().to_string(),
            Direction::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(side) => write!(f, "{side}"),
            Self::Unrecognized(raw) => write!(f, "{raw}"),
        }
    }
}
