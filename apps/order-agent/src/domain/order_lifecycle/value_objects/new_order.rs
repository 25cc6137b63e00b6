//! Wire-level order requests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderSide, OrderType, TimeInForce};
use crate::domain::shared::OrderId;

/// Request to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// V3 market symbol.
    pub market_symbol: String,
    /// Order side.
    pub direction: OrderSide,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Quantity in base currency.
    pub quantity: Decimal,
    /// Limit price (for limit orders).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<Decimal>,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

impl NewOrder {
    /// Create a market order request (immediate-or-cancel).
    #[must_use]
    pub fn market(market_symbol: impl Into<String>, direction: OrderSide, quantity: Decimal) -> Self {
        Self {
            market_symbol: market_symbol.into(),
            direction,
            order_type: OrderType::Market,
            quantity,
            limit: None,
            time_in_force: TimeInForce::Ioc,
        }
    }

    /// Create a limit order request (good-til-cancelled).
    #[must_use]
    pub fn limit(
        market_symbol: impl Into<String>,
        direction: OrderSide,
        quantity: Decimal,
        limit: Decimal,
    ) -> Self {
        Self {
            market_symbol: market_symbol.into(),
            direction,
            order_type: OrderType::Limit,
            quantity,
            limit: Some(limit),
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// Build a request from a side/type/size/price tuple.
    ///
    /// Market types ignore the price and use IOC; everything else is a GTC limit.
    #[must_use]
    pub fn from_parts(
        market_symbol: impl Into<String>,
        direction: OrderSide,
        order_type: OrderType,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        if order_type.is_market() {
            Self::market(market_symbol, direction, quantity)
        } else {
            Self::limit(market_symbol, direction, quantity, price)
        }
    }
}

/// Comparison a conditional order applies between ticker and trigger price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerOperand {
    /// Trigger when the price rises to or above the trigger.
    #[serde(rename = "GTE")]
    Gte,
    /// Trigger when the price falls to or below the trigger.
    #[serde(rename = "LTE")]
    Lte,
}

impl TriggerOperand {
    /// Whether `price` satisfies this operand against `trigger`.
    #[must_use]
    pub fn is_met(&self, price: Decimal, trigger: Decimal) -> bool {
        match self {
            Self::Gte => price >= trigger,
            Self::Lte => price <= trigger,
        }
    }
}

/// Reference to the order a conditional order cancels when it triggers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderToCancel {
    /// Kind of referenced entity (always `ORDER` here).
    #[serde(rename = "type")]
    pub kind: String,
    /// Referenced order.
    pub id: OrderId,
}

impl OrderToCancel {
    /// Reference a plain order.
    #[must_use]
    pub fn order(id: OrderId) -> Self {
        Self {
            kind: "ORDER".to_string(),
            id,
        }
    }
}

/// Request to place a conditional order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConditionalOrder {
    /// V3 market symbol.
    pub market_symbol: String,
    /// Trigger comparison.
    pub operand: TriggerOperand,
    /// Trigger price.
    pub trigger_price: Decimal,
    /// Order submitted when triggered.
    pub order_to_create: NewOrder,
    /// Order cancelled when triggered.
    pub order_to_cancel: OrderToCancel,
}

impl NewConditionalOrder {
    /// Stop-loss leg: market sell `quantity` when the price falls to `stop`,
    /// cancelling the protected order `parent`.
    #[must_use]
    pub fn stop_loss(
        market_symbol: impl Into<String>,
        quantity: Decimal,
        stop: Decimal,
        parent: OrderId,
    ) -> Self {
        let market_symbol = market_symbol.into();
        Self {
            order_to_create: NewOrder::market(market_symbol.clone(), OrderSide::Sell, quantity),
            market_symbol,
            operand: TriggerOperand::Lte,
            trigger_price: stop,
            order_to_cancel: OrderToCancel::order(parent),
        }
    }
}
