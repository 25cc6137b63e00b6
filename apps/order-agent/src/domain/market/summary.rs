//! Exchange-neutral order summaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::order_lifecycle::{Order, OrderSide};
use crate::domain::shared::{ApiVersion, DomainError};

/// Compact view of an opened or closed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    /// Side, if recognized.
    pub side: Option<OrderSide>,
    /// Market name in the configured convention.
    pub market: String,
    /// Ordered size.
    pub size: Decimal,
    /// Order price.
    pub price: Decimal,
    /// Close time for closed orders, creation time for open ones.
    pub at: DateTime<Utc>,
}

impl OrderSummary {
    /// Summary of a closed order.
    pub fn closed(order: &Order, version: ApiVersion) -> Result<Self, DomainError> {
        let at = order.closed_time()?.map_or_else(|| order.created_time(), Ok)?;
        Ok(Self {
            side: order.side(),
            market: order.market_name(version),
            size: order.quantity,
            price: order.price(),
            at,
        })
    }

    /// Summary of an open order.
    pub fn opened(order: &Order, version: ApiVersion) -> Result<Self, DomainError> {
        Ok(Self {
            side: order.side(),
            market: order.market_name(version),
            size: order.quantity,
            price: order.price(),
            at: order.created_time()?,
        })
    }
}
