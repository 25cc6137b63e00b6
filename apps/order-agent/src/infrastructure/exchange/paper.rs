//! In-process paper exchange.
//!
//! Keeps markets, tickers, open orders, closed history and conditional orders
//! in memory. Orders match only against the configured ticker:
//!
//! - market orders fill at the ticker immediately
//! - limit buys fill at their limit when the ticker is at or below it,
//!   limit sells when the ticker is at or above it; otherwise they rest
//! - [`PaperExchange::move_price`] fires conditional orders and fills resting
//!   limits crossed by the new price
//!
//! A market buy is rejected as a self-trade while one of the account's own
//! sells rests at or below the ticker.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::application::ports::{Clock, ExchangeError, ExchangePort, OrderScope};
use crate::domain::market::{BookEntry, Market, MarketSummary, OrderBook, Ticker};
use crate::domain::order_lifecycle::aggregate::format_exchange_time;
use crate::domain::order_lifecycle::{
    ConditionalOrder, Direction, NewConditionalOrder, NewOrder, Order, OrderSide, OrderType,
};
use crate::domain::shared::{ConditionalOrderId, OrderId};
use crate::infrastructure::clock::SystemClock;

const STATUS_OPEN: &str = "OPEN";
const STATUS_CLOSED: &str = "CLOSED";

#[derive(Debug, Default)]
struct Failures {
    query: Option<ExchangeError>,
    order: Option<ExchangeError>,
    conditional: Option<ExchangeError>,
    cancel: Option<ExchangeError>,
}

#[derive(Debug, Default)]
struct Book {
    markets: Vec<Market>,
    tickers: HashMap<String, Decimal>,
    open: Vec<Order>,
    /// Most recent first.
    history: Vec<Order>,
    conditionals: Vec<ConditionalOrder>,
    failures: Failures,
    always_self_trade: bool,
    attempted_buys: Vec<Decimal>,
}

impl Book {
    fn ticker(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.tickers
            .get(&symbol.to_ascii_uppercase())
            .copied()
            .filter(|price| *price > Decimal::ZERO)
            .ok_or_else(|| ExchangeError::Api {
                code: "MARKET_NOT_TRADING".to_string(),
                message: format!("no ticker for {symbol}"),
            })
    }

    fn market(&self, symbol: &str) -> Result<&Market, ExchangeError> {
        self.markets
            .iter()
            .find(|m| m.symbol.eq_ignore_ascii_case(symbol) && m.is_online())
            .ok_or_else(|| ExchangeError::UnknownMarket {
                market: symbol.to_string(),
            })
    }

    fn take_open(&mut self, id: &OrderId) -> Option<Order> {
        let index = self.open.iter().position(|o| &o.id == id)?;
        Some(self.open.remove(index))
    }

    fn close(&mut self, mut order: Order, price: Decimal, now: String) -> Order {
        order.fill_quantity = order.quantity;
        order.proceeds = order.quantity * price;
        order.status = STATUS_CLOSED.to_string();
        order.closed_at = Some(now);
        self.history.insert(0, order.clone());
        order
    }

    fn would_self_trade(&self, symbol: &str, side: OrderSide, ticker: Decimal) -> bool {
        self.open.iter().any(|o| {
            o.market_symbol.eq_ignore_ascii_case(symbol)
                && o.direction.is(side.opposite())
                && match side {
                    OrderSide::Buy => o.price() <= ticker,
                    OrderSide::Sell => o.price() >= ticker,
                }
        })
    }
}

fn crosses(side: OrderSide, limit: Decimal, ticker: Decimal) -> bool {
    match side {
        OrderSide::Buy => limit >= ticker,
        OrderSide::Sell => limit <= ticker,
    }
}

/// Paper-trading exchange.
pub struct PaperExchange {
    book: Mutex<Book>,
    clock: Arc<dyn Clock>,
}

impl PaperExchange {
    /// Exchange listing `markets`, stamping orders with wall-clock time.
    pub fn new(markets: Vec<Market>) -> Self {
        Self::with_clock(markets, Arc::new(SystemClock))
    }

    /// Exchange stamping orders with `clock`.
    pub fn with_clock(markets: Vec<Market>, clock: Arc<dyn Clock>) -> Self {
        Self {
            book: Mutex::new(Book {
                markets,
                ..Book::default()
            }),
            clock,
        }
    }

    fn now(&self) -> String {
        format_exchange_time(self.clock.now())
    }

    /// List an additional market.
    pub fn list_market(&self, market: Market) {
        self.book.lock().markets.push(market);
    }

    /// Set the last trade price without matching anything.
    pub fn set_ticker(&self, symbol: &str, price: Decimal) {
        self.book.lock().tickers.insert(symbol.to_ascii_uppercase(), price);
    }

    /// Move the price: fire conditional orders whose trigger is met, then
    /// fill resting limits the new price crosses. Returns the orders closed.
    pub fn move_price(&self, symbol: &str, price: Decimal) -> Vec<Order> {
        let now = self.now();
        let mut book = self.book.lock();
        book.tickers.insert(symbol.to_ascii_uppercase(), price);
        let mut closed = Vec::new();

        let (fired, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut book.conditionals)
            .into_iter()
            .partition(|c| c.market_symbol.eq_ignore_ascii_case(symbol) && c.operand.is_met(price, c.trigger_price));
        book.conditionals = waiting;
        for conditional in fired {
            if let Some(cancel) = &conditional.order_to_cancel {
                book.take_open(&cancel.id);
            }
            if let Some(request) = &conditional.order_to_create {
                let order = Self::materialize(request, now.clone());
                info!(conditional_id = %conditional.id, order_id = %order.id, "Conditional order triggered");
                closed.push(book.close(order, price, now.clone()));
            }
        }

        let (filled, resting): (Vec<_>, Vec<_>) = std::mem::take(&mut book.open).into_iter().partition(|o| {
            o.market_symbol.eq_ignore_ascii_case(symbol)
                && o.side().is_some_and(|side| crosses(side, o.price(), price))
        });
        book.open = resting;
        for order in filled {
            let limit = order.price();
            closed.push(book.close(order, limit, now.clone()));
        }
        closed
    }

    /// Put an order straight on the book as open, bypassing matching.
    pub fn rest(&self, side: OrderSide, symbol: &str, kind: OrderType, quantity: Decimal, price: Decimal) -> Order {
        let request = NewOrder::from_parts(symbol, side, kind, quantity, price);
        let order = Self::materialize(&request, self.now());
        self.book.lock().open.push(order.clone());
        order
    }

    /// Fill an open order completely at its own price.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::NotFound`] if the order is not open.
    pub fn fill(&self, id: &OrderId) -> Result<Order, ExchangeError> {
        let now = self.now();
        let mut book = self.book.lock();
        let order = book.take_open(id).ok_or_else(|| ExchangeError::NotFound { id: id.to_string() })?;
        let price = match order.price() {
            p if p > Decimal::ZERO => p,
            _ => book.ticker(&order.market_symbol)?,
        };
        Ok(book.close(order, price, now))
    }

    /// Record `order` as filled at `average_price`, removing it from the open
    /// orders if it is there.
    pub fn close_as(&self, order: Order, average_price: Decimal) -> Order {
        let now = self.now();
        let mut book = self.book.lock();
        book.take_open(&order.id);
        book.close(order, average_price, now)
    }

    /// Fail the next open-order, history or conditional-order query.
    pub fn fail_next_query(&self, error: ExchangeError) {
        self.book.lock().failures.query = Some(error);
    }

    /// Fail the next order placement.
    pub fn fail_next_order(&self, error: ExchangeError) {
        self.book.lock().failures.order = Some(error);
    }

    /// Fail the next conditional-order placement.
    pub fn fail_next_conditional(&self, error: ExchangeError) {
        self.book.lock().failures.conditional = Some(error);
    }

    /// Fail the next order cancellation.
    pub fn fail_next_cancel(&self, error: ExchangeError) {
        self.book.lock().failures.cancel = Some(error);
    }

    /// Reject every market buy as a self-trade.
    pub fn always_self_trade(&self, enabled: bool) {
        self.book.lock().always_self_trade = enabled;
    }

    /// Sizes of every buy submitted, accepted or not.
    #[must_use]
    pub fn attempted_buy_sizes(&self) -> Vec<Decimal> {
        self.book.lock().attempted_buys.clone()
    }

    /// Number of open orders.
    #[must_use]
    pub fn open_order_count(&self) -> usize {
        self.book.lock().open.len()
    }

    fn materialize(request: &NewOrder, created_at: String) -> Order {
        Order {
            id: OrderId::generate(),
            market_symbol: request.market_symbol.to_ascii_uppercase(),
            direction: Direction::Known(request.direction),
            order_type: request.order_type,
            quantity: request.quantity,
            limit: request.limit,
            time_in_force: request.time_in_force,
            fill_quantity: Decimal::ZERO,
            commission: Decimal::ZERO,
            proceeds: Decimal::ZERO,
            status: STATUS_OPEN.to_string(),
            created_at,
            closed_at: None,
        }
    }

    fn check_query(&self) -> Result<(), ExchangeError> {
        self.book.lock().failures.query.take().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ExchangePort for PaperExchange {
    async fn markets(&self) -> Result<Vec<Market>, ExchangeError> {
        Ok(self.book.lock().markets.clone())
    }

    async fn ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let book = self.book.lock();
        book.market(symbol)?;
        let last = book.ticker(symbol)?;
        Ok(Ticker {
            last_trade_rate: last,
            bid_rate: last,
            ask_rate: last,
        })
    }

    async fn market_summary(&self, symbol: &str) -> Result<MarketSummary, ExchangeError> {
        let book = self.book.lock();
        let market = book.market(symbol)?;
        let trades: Vec<&Order> = book
            .history
            .iter()
            .filter(|o| o.market_symbol.eq_ignore_ascii_case(symbol))
            .collect();
        Ok(MarketSummary {
            symbol: market.symbol.clone(),
            high: trades.iter().map(|o| o.price()).max().unwrap_or_default(),
            low: trades.iter().map(|o| o.price()).min().unwrap_or_default(),
            volume: trades.iter().map(|o| o.fill_quantity).sum(),
            quote_volume: trades.iter().map(|o| o.proceeds).sum(),
        })
    }

    async fn order_book(&self, symbol: &str, depth: u32) -> Result<OrderBook, ExchangeError> {
        let book = self.book.lock();
        book.market(symbol)?;
        let side = |side: OrderSide| -> Vec<BookEntry> {
            book.open
                .iter()
                .filter(|o| o.market_symbol.eq_ignore_ascii_case(symbol) && o.direction.is(side))
                .map(|o| BookEntry {
                    quantity: o.quantity - o.fill_quantity,
                    rate: o.price(),
                })
                .collect()
        };
        let mut bid = side(OrderSide::Buy);
        let mut ask = side(OrderSide::Sell);
        bid.sort_by(|a, b| b.rate.cmp(&a.rate));
        ask.sort_by(|a, b| a.rate.cmp(&b.rate));
        bid.truncate(depth as usize);
        ask.truncate(depth as usize);
        Ok(OrderBook { bid, ask })
    }

    async fn open_orders(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError> {
        self.check_query()?;
        Ok(self
            .book
            .lock()
            .open
            .iter()
            .filter(|o| scope.covers(&o.market_symbol))
            .cloned()
            .collect())
    }

    async fn order_history(&self, scope: &OrderScope) -> Result<Vec<Order>, ExchangeError> {
        self.check_query()?;
        Ok(self
            .book
            .lock()
            .history
            .iter()
            .filter(|o| scope.covers(&o.market_symbol))
            .cloned()
            .collect())
    }

    async fn create_order(&self, request: &NewOrder) -> Result<Order, ExchangeError> {
        let now = self.now();
        let mut book = self.book.lock();
        if request.direction == OrderSide::Buy {
            book.attempted_buys.push(request.quantity);
        }
        if let Some(error) = book.failures.order.take() {
            return Err(error);
        }

        let min_trade_size = book.market(&request.market_symbol)?.min_trade_size;
        if request.quantity < min_trade_size {
            return Err(ExchangeError::MinTradeRequirementNotMet {
                message: format!("{} is below the minimum of {min_trade_size}", request.quantity),
            });
        }

        let ticker = book.ticker(&request.market_symbol)?;
        let order = Self::materialize(request, now.clone());
        if request.order_type.is_market() {
            let self_trade = (request.direction == OrderSide::Buy && book.always_self_trade)
                || book.would_self_trade(&request.market_symbol, request.direction, ticker);
            if self_trade {
                return Err(ExchangeError::SelfTrade {
                    message: format!("{} would match an own order", request.market_symbol),
                });
            }
            debug!(order_id = %order.id, price = %ticker, "Paper market order filled");
            return Ok(book.close(order, ticker, now));
        }

        let limit = request.limit.unwrap_or_default();
        if crosses(request.direction, limit, ticker) {
            debug!(order_id = %order.id, price = %limit, "Paper limit order filled on entry");
            return Ok(book.close(order, limit, now));
        }
        book.open.push(order.clone());
        Ok(order)
    }

    async fn cancel_order(&self, id: &OrderId) -> Result<(), ExchangeError> {
        let mut book = self.book.lock();
        if let Some(error) = book.failures.cancel.take() {
            return Err(error);
        }
        book.take_open(id)
            .map(|_| ())
            .ok_or_else(|| ExchangeError::NotFound { id: id.to_string() })
    }

    async fn open_conditional_orders(&self, symbol: &str) -> Result<Vec<ConditionalOrder>, ExchangeError> {
        self.check_query()?;
        Ok(self
            .book
            .lock()
            .conditionals
            .iter()
            .filter(|c| c.market_symbol.eq_ignore_ascii_case(symbol))
            .cloned()
            .collect())
    }

    async fn create_conditional_order(&self, request: &NewConditionalOrder) -> Result<ConditionalOrder, ExchangeError> {
        let mut book = self.book.lock();
        if let Some(error) = book.failures.conditional.take() {
            return Err(error);
        }
        book.market(&request.market_symbol)?;
        if !book.open.iter().any(|o| o.id == request.order_to_cancel.id) {
            return Err(ExchangeError::InvalidCancelOrder {
                message: format!("order {} is not open", request.order_to_cancel.id),
            });
        }
        let conditional = ConditionalOrder {
            id: ConditionalOrderId::generate(),
            market_symbol: request.market_symbol.to_ascii_uppercase(),
            operand: request.operand,
            trigger_price: request.trigger_price,
            order_to_create: Some(request.order_to_create.clone()),
            order_to_cancel: Some(request.order_to_cancel.clone()),
            status: STATUS_OPEN.to_string(),
        };
        book.conditionals.push(conditional.clone());
        Ok(conditional)
    }

    async fn cancel_conditional_order(&self, id: &ConditionalOrderId) -> Result<(), ExchangeError> {
        let mut book = self.book.lock();
        let index = book
            .conditionals
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ExchangeError::NotFound { id: id.to_string() })?;
        book.conditionals.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::fixtures::market;
    use rust_decimal_macros::dec;

    fn exchange() -> PaperExchange {
        let exchange = PaperExchange::new(vec![market("ETH", "BTC", 2)]);
        exchange.set_ticker("ETH-BTC", dec!(100));
        exchange
    }

    #[tokio::test]
    async fn limit_orders_rest_until_crossed() {
        let exchange = exchange();
        let buy = exchange
            .create_order(&NewOrder::limit("ETH-BTC", OrderSide::Buy, dec!(1), dec!(95)))
            .await
            .unwrap();
        assert_eq!(exchange.open_order_count(), 1);

        let closed = exchange.move_price("ETH-BTC", dec!(94));
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, buy.id);
        assert_eq!(closed[0].proceeds, dec!(95));
        assert_eq!(exchange.open_order_count(), 0);
    }

    #[tokio::test]
    async fn crossing_limit_fills_on_entry() {
        let exchange = exchange();
        let sell = exchange
            .create_order(&NewOrder::limit("ETH-BTC", OrderSide::Sell, dec!(2), dec!(99)))
            .await
            .unwrap();
        assert_eq!(sell.status, STATUS_CLOSED);
        let history = exchange.order_history(&OrderScope::All).await.unwrap();
        assert_eq!(history[0].id, sell.id);
    }

    #[tokio::test]
    async fn stop_fires_and_cancels_protected_sell() {
        let exchange = exchange();
        let sell = exchange
            .create_order(&NewOrder::limit("ETH-BTC", OrderSide::Sell, dec!(2), dec!(105)))
            .await
            .unwrap();
        exchange
            .create_conditional_order(&NewConditionalOrder::stop_loss("ETH-BTC", dec!(2), dec!(95), sell.id.clone()))
            .await
            .unwrap();

        let closed = exchange.move_price("ETH-BTC", dec!(94));
        assert_eq!(closed.len(), 1);
        assert!(closed[0].is_market());
        assert_eq!(closed[0].price(), dec!(94));
        assert_eq!(exchange.open_order_count(), 0);
        assert!(exchange.open_conditional_orders("ETH-BTC").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conditional_for_closed_order_is_invalid() {
        let exchange = exchange();
        let request = NewConditionalOrder::stop_loss("ETH-BTC", dec!(1), dec!(90), OrderId::new("gone"));
        assert!(matches!(
            exchange.create_conditional_order(&request).await,
            Err(ExchangeError::InvalidCancelOrder { .. })
        ));
    }

    #[tokio::test]
    async fn market_buy_against_own_cheap_sell_is_self_trade() {
        let exchange = exchange();
        exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(1), dec!(99));
        let result = exchange.create_order(&NewOrder::market("ETH-BTC", OrderSide::Buy, dec!(1))).await;
        assert!(matches!(result, Err(ExchangeError::SelfTrade { .. })));
        assert_eq!(exchange.attempted_buy_sizes(), vec![dec!(1)]);
    }

    #[tokio::test]
    async fn minimum_size_and_unknown_market_are_rejected() {
        let exchange = exchange();
        let small = exchange
            .create_order(&NewOrder::limit("ETH-BTC", OrderSide::Buy, dec!(0.001), dec!(90)))
            .await;
        assert!(matches!(small, Err(ExchangeError::MinTradeRequirementNotMet { .. })));
        let unknown = exchange
            .create_order(&NewOrder::limit("XYZ-BTC", OrderSide::Buy, dec!(1), dec!(90)))
            .await;
        assert!(matches!(unknown, Err(ExchangeError::UnknownMarket { .. })));
    }

    #[tokio::test]
    async fn book_and_summary_reflect_orders() {
        let exchange = exchange();
        exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(90));
        exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(2), dec!(95));
        let sell = exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(3), dec!(110));
        exchange.fill(&sell.id).unwrap();

        let book = exchange.order_book("ETH-BTC", 500).await.unwrap();
        assert_eq!(book.bid[0].rate, dec!(95));
        assert!(book.ask.is_empty());

        let summary = exchange.market_summary("ETH-BTC").await.unwrap();
        assert_eq!(summary.high, dec!(110));
        assert_eq!(summary.volume, dec!(3));
        assert_eq!(summary.quote_volume, dec!(330));
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let exchange = exchange();
        exchange.fail_next_query(ExchangeError::Transport {
            message: "reset".to_string(),
        });
        assert!(exchange.open_orders(&OrderScope::All).await.is_err());
        assert!(exchange.open_orders(&OrderScope::All).await.is_ok());
    }
}
