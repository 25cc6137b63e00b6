//! Buy ladder levels.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::{OrderSide, OrderSnapshot, OrderType};
use crate::domain::shared::{OrderId, precision};

/// One target price level of the desired buy ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyCall {
    /// Limit price of the level.
    pub price: Decimal,
    /// Set when an open buy already covers this level.
    #[serde(default)]
    pub skip: bool,
}

impl BuyCall {
    /// Level at `price`.
    #[must_use]
    pub const fn new(price: Decimal) -> Self {
        Self { price, skip: false }
    }

    /// Price and order type after applying a deviation.
    ///
    /// The level moves to `price × deviation`. When the ticker already trades
    /// at or below that limit the level is placed as a market order.
    #[must_use]
    pub fn deviate(
        &self,
        kind: OrderType,
        deviation: Decimal,
        ticker: Decimal,
        price_precision: u32,
    ) -> (OrderType, Decimal) {
        let limit = precision::round(self.price * deviation, price_precision);
        if kind == OrderType::Limit && ticker > Decimal::ZERO && ticker <= limit {
            (OrderType::Market, limit)
        } else {
            (kind, limit)
        }
    }
}

/// Outcome of reconciling a ladder against the open book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LadderPlan {
    /// Levels, with `skip` set where an open order already matches.
    pub calls: Vec<BuyCall>,
    /// Open buy orders to cancel.
    pub cancel: Vec<OrderId>,
}

/// Mark levels already covered by an open buy of identical price and size,
/// and collect every other open buy for cancellation.
#[must_use]
pub fn plan_ladder(calls: &[BuyCall], size: Decimal, open: &OrderSnapshot) -> LadderPlan {
    let mut plan = LadderPlan {
        calls: calls.to_vec(),
        cancel: Vec::new(),
    };
    for order in open.orders().iter().filter(|o| o.direction.is(OrderSide::Buy)) {
        let matching = plan.calls.iter().position(|call| call.price == order.price());
        match matching {
            Some(index) if order.quantity == size => plan.calls[index].skip = true,
            _ => plan.cancel.push(order.id.clone()),
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::aggregate::fixtures::limit_order;
    use rust_decimal_macros::dec;

    fn ladder() -> Vec<BuyCall> {
        vec![BuyCall::new(dec!(90)), BuyCall::new(dec!(80))]
    }

    #[test]
    fn exact_match_is_skipped_not_cancelled() {
        let open = OrderSnapshot::new(vec![limit_order("a", OrderSide::Buy, dec!(2), dec!(90))]);
        let plan = plan_ladder(&ladder(), dec!(2), &open);
        assert!(plan.calls[0].skip);
        assert!(!plan.calls[1].skip);
        assert!(plan.cancel.is_empty());
    }

    #[test]
    fn size_mismatch_is_cancelled() {
        let open = OrderSnapshot::new(vec![limit_order("a", OrderSide::Buy, dec!(3), dec!(90))]);
        let plan = plan_ladder(&ladder(), dec!(2), &open);
        assert!(!plan.calls[0].skip);
        assert_eq!(plan.cancel, vec![OrderId::new("a")]);
    }

    #[test]
    fn sells_are_left_alone() {
        let open = OrderSnapshot::new(vec![limit_order("s", OrderSide::Sell, dec!(2), dec!(120))]);
        let plan = plan_ladder(&ladder(), dec!(2), &open);
        assert!(plan.cancel.is_empty());
    }

    #[test]
    fn deviation_switches_to_market_when_ticker_is_below() {
        let call = BuyCall::new(dec!(100));
        assert_eq!(call.deviate(OrderType::Limit, dec!(1.01), dec!(100.5), 2), (OrderType::Market, dec!(101.00)));
        assert_eq!(call.deviate(OrderType::Limit, dec!(0.99), dec!(100.5), 2), (OrderType::Limit, dec!(99.00)));
    }
}
