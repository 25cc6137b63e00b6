//! Time in force for orders.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::OrderType;

/// Time in force specifying order validity duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[serde(rename = "GOOD_TIL_CANCELLED")]
    Gtc,
    /// Immediate-or-cancel (fill immediately, cancel remainder).
    #[serde(rename = "IMMEDIATE_OR_CANCEL")]
    Ioc,
    /// Fill-or-kill (all or nothing, immediate execution required).
    #[serde(rename = "FILL_OR_KILL")]
    Fok,
    /// Good-til-cancelled, maker only.
    #[serde(rename = "POST_ONLY_GOOD_TIL_CANCELLED")]
    PostOnlyGtc,
}

impl TimeInForce {
    /// Time in force the agent uses for an order type: market orders are
    /// immediate-or-cancel, resting orders good-til-cancelled.
    #[must_use]
    pub const fn for_order_type(order_type: OrderType) -> Self {
        if order_type.is_market() {
            Self::Ioc
        } else {
            Self::Gtc
        }
    }

    /// Returns true if the order can rest on the book.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        matches!(self, Self::Gtc | Self::PostOnlyGtc)
    }

    /// Returns true if the order requires immediate execution.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gtc => write!(f, "GTC"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
            Self::PostOnlyGtc => write!(f, "POST_ONLY_GTC"),
        }
    }
}
