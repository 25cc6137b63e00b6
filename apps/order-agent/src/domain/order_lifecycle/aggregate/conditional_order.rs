//! Server-side conditional (trigger) order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::value_objects::{NewOrder, OrderToCancel, TriggerOperand};
use crate::domain::shared::{ConditionalOrderId, OrderId};

/// A trigger order guarding a parent order.
///
/// When the trigger fires the exchange cancels `order_to_cancel` and submits
/// `order_to_create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalOrder {
    /// Exchange-assigned identifier.
    pub id: ConditionalOrderId,
    /// V3 market symbol.
    pub market_symbol: String,
    /// Trigger comparison.
    pub operand: TriggerOperand,
    /// Trigger price.
    pub trigger_price: Decimal,
    /// Order submitted on trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_to_create: Option<NewOrder>,
    /// Order cancelled on trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_to_cancel: Option<OrderToCancel>,
    /// Raw status.
    pub status: String,
}

impl ConditionalOrder {
    /// True if this conditional order protects `order_id`.
    #[must_use]
    pub fn references(&self, order_id: &OrderId) -> bool {
        self.order_to_cancel
            .as_ref()
            .is_some_and(|target| &target.id == order_id)
    }
}
