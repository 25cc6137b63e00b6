//! Point-in-time order snapshots.
//!
//! The engine never keeps live order state between polls. It keeps the last
//! two observations of the open list and the closed history and diffs them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::order_lifecycle::aggregate::Order;
use crate::domain::order_lifecycle::value_objects::OrderSide;
use crate::domain::shared::OrderId;

/// Orders observed at one poll, in exchange order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    orders: Vec<Order>,
}

impl OrderSnapshot {
    /// Wrap orders returned by the exchange.
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// The observed orders.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Number of orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when no orders were observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Consume into the order list.
    #[must_use]
    pub fn into_orders(self) -> Vec<Order> {
        self.orders
    }

    /// True if an order with this id is present.
    #[must_use]
    pub fn contains(&self, id: &OrderId) -> bool {
        self.orders.iter().any(|o| &o.id == id)
    }

    /// True if an order with this id and side is present.
    #[must_use]
    pub fn contains_with_side(&self, id: &OrderId, side: OrderSide) -> bool {
        self.orders
            .iter()
            .any(|o| &o.id == id && o.direction.is(side))
    }

    /// Look up an order by id.
    #[must_use]
    pub fn find(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Ids in this snapshot.
    #[must_use]
    pub fn ids(&self) -> HashSet<&OrderId> {
        self.orders.iter().map(|o| &o.id).collect()
    }

    /// Orders present here but absent from `previous`.
    #[must_use]
    pub fn added_since<'a>(&'a self, previous: &Self) -> Vec<&'a Order> {
        let before = previous.ids();
        self.orders.iter().filter(|o| !before.contains(&o.id)).collect()
    }

    /// Orders present in `previous` but absent here.
    #[must_use]
    pub fn removed_since<'a>(&self, previous: &'a Self) -> Vec<&'a Order> {
        let now = self.ids();
        previous.orders.iter().filter(|o| !now.contains(&o.id)).collect()
    }
}

impl From<Vec<Order>> for OrderSnapshot {
    fn from(orders: Vec<Order>) -> Self {
        Self::new(orders)
    }
}

/// The two snapshots carried across iterations.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    /// Last observed open orders.
    pub open: OrderSnapshot,
    /// Last observed closed-order history.
    pub history: OrderSnapshot,
}

impl SnapshotStore {
    /// Create from the initial observations.
    #[must_use]
    pub const fn new(open: OrderSnapshot, history: OrderSnapshot) -> Self {
        Self { open, history }
    }

    /// Replace the open snapshot, returning the previous one.
    pub fn replace_open(&mut self, next: OrderSnapshot) -> OrderSnapshot {
        std::mem::replace(&mut self.open, next)
    }

    /// Replace the history snapshot, returning the previous one.
    pub fn replace_history(&mut self, next: OrderSnapshot) -> OrderSnapshot {
        std::mem::replace(&mut self.history, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order_lifecycle::aggregate::fixtures::limit_order;
    use rust_decimal_macros::dec;

    fn snapshot(ids: &[&str]) -> OrderSnapshot {
        ids.iter()
            .map(|id| limit_order(id, OrderSide::Buy, dec!(1), dec!(1)))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn added_and_removed() {
        let previous = snapshot(&["a", "b"]);
        let current = snapshot(&["b", "c"]);

        let added: Vec<_> = current.added_since(&previous).iter().map(|o| o.id.as_str()).collect();
        let removed: Vec<_> = current.removed_since(&previous).iter().map(|o| o.id.as_str()).collect();

        assert_eq!(added, vec!["c"]);
        assert_eq!(removed, vec!["a"]);
    }

    #[test]
    fn contains_with_side_checks_direction() {
        let current = snapshot(&["a"]);
        assert!(current.contains_with_side(&OrderId::new("a"), OrderSide::Buy));
        assert!(!current.contains_with_side(&OrderId::new("a"), OrderSide::Sell));
        assert!(!current.contains(&OrderId::new("z")));
    }

    #[test]
    fn replace_returns_previous() {
        let mut store = SnapshotStore::new(snapshot(&["a"]), OrderSnapshot::default());
        let previous = store.replace_open(snapshot(&["b"]));
        assert!(previous.contains(&OrderId::new("a")));
        assert!(store.open.contains(&OrderId::new("b")));
    }
}
