//! Exchange decorator that routes every call through the request governor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::ports::{ExchangeError, ExchangePort, OrderScope};
use crate::application::services::RequestGovernor;
use crate::domain::market::{Market, MarketSummary, OrderBook, Ticker};
use crate::domain::order_lifecycle::{ConditionalOrder, NewConditionalOrder, NewOrder, Order};
use crate::domain::shared::{ConditionalOrderId, OrderId};

const CANCEL_ORDER_PATH: &str = "/orders/{orderId}";
const CANCEL_CONDITIONAL_PATH: &str = "/conditional-orders/{conditionalOrderId}";

/// Paces and throttles an inner exchange.
///
/// Each call is admitted under the REST path the live API would use, so the
/// per-endpoint intensity table applies. Order ids are left as placeholders
/// so every cancel shares one endpoint record.
pub struct GovernedExchange<E: ExchangePort> {
    inner: E,
    governor: Arc<RequestGovernor>,
}

impl<E: ExchangePort> GovernedExchange<E> {
    /// Wrap `inner`.
    pub const fn new(inner: E, governor: Arc<RequestGovernor>) -> Self {
        Self { inner, governor }
    }

    /// The undecorated exchange.
    pub const fn inner(&self) -> &E {
        &self.inner
    }
}

#[async_trait]
impl<E: ExchangePort> ExchangePort for GovernedExchange<E> {
    async fn markets(&self) -> Result<Vec<Market>, ExchangeError> {
        self.governor.execute("/markets", || self.inner.markets()).await
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let path = format!("/markets/{symbol}/ticker");
        self.governor.execute(&path, || self.inner.ticker(symbol)).await
    }

    async fn market_summary(&self, symbol: &str) -> Result<MarketSummary, ExchangeError> {
        let path = format!("/markets/{symbol}/summary");
        self.governor.execute(&path, || self.inner.market_summary(symbol)).await
    }

    async fn order_book(&self, symbol: &str, depth: u32) -> Result<OrderBook, ExchangeError> {
        let path = format!("/markets/{symbol}/orderbook?depth={depth}");
        self.governor.execute(&path, || self.inner.order_book(symbol, depth)).await
    }

    async fn open_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError> {
        let path = format!("/orders/open{}", scope.query());
        self.governor.execute(&path, || self.inner.open_orders(scope)).await
    }

    async fn order_history(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError> {
        let path = format!("/orders/closed{}", scope.query());
        self.governor.execute(&path, || self.inner.order_history(scope)).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, ExchangeError> {
        self.governor.execute("/orders", || self.inner.create_order(order)).await
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<(), ExchangeError> {
        self.governor
            .execute(CANCEL_ORDER_PATH, || self.inner.cancel_order(id))
            .await
    }

    async fn open_conditional_orders(&self, symbol: &str) -> Result<Vec<ConditionalOrder>, ExchangeError> {
        let path = format!("/conditional-orders/open?marketSymbol={symbol}");
        self.governor
            .execute(&path, || self.inner.open_conditional_orders(symbol))
            .await
    }

    async fn create_conditional_order(
        &self,
        order: &NewConditionalOrder,
    ) -> Result<ConditionalOrder, ExchangeError> {
        self.governor
            .execute("/conditional-orders", || self.inner.create_conditional_order(order))
            .await
    }

    async fn cancel_conditional_order(&self, id: &ConditionalOrderId) -> Result<(), ExchangeError> {
        self.governor
            .execute(CANCEL_CONDITIONAL_PATH, || self.inner.cancel_conditional_order(id))
            .await
    }
}
