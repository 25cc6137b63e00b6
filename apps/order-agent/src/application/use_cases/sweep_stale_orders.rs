//! Sweep Stale Orders Use Case
//!
//! The exchange purges orders after 28 days. Orders older than the maximum
//! age are cancelled and placed again so they stay on the book.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::{Context, EngineError};
use crate::application::ports::{ExchangePort, Notification};
use crate::application::services::{Notifier, OrderComposer};
use crate::domain::order_lifecycle::{Order, OrderSide, OrderSnapshot, OrderType};
use crate::domain::shared::{ApiVersion, OrderId};
use crate::domain::strategy::{MessageKind, NotifyLevel};
use crate::observability::record_stale_order_reopened;

/// Default maximum order age in days.
pub const DEFAULT_MAX_ORDER_AGE_DAYS: i64 = 21;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Orders cancelled and placed again, old id to new order.
    pub reopened: Vec<(OrderId, Order)>,
    /// Orders that could not be handled.
    pub failures: Vec<(OrderId, EngineError)>,
}

/// Use case for reopening stale orders.
pub struct SweepStaleOrdersUseCase<E: ExchangePort> {
    composer: Arc<OrderComposer<E>>,
    notifier: Arc<Notifier>,
    max_age: Duration,
    version: ApiVersion,
}

impl<E: ExchangePort> SweepStaleOrdersUseCase<E> {
    /// Create a new `SweepStaleOrdersUseCase`.
    pub const fn new(
        composer: Arc<OrderComposer<E>>,
        notifier: Arc<Notifier>,
        max_age: Duration,
        version: ApiVersion,
    ) -> Self {
        Self {
            composer,
            notifier,
            max_age,
            version,
        }
    }

    /// Reopen every order in `open` created at least `max_age` before `now`.
    ///
    /// A failing order is logged and notified and does not stop the sweep.
    pub async fn execute(&self, open: &OrderSnapshot, level: NotifyLevel, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        for order in open.orders() {
            let Some(side) = order.side() else {
                continue;
            };
            match self.sweep_one(order, side, level, now).await {
                Ok(Some(reopened)) => {
                    record_stale_order_reopened();
                    report.reopened.push((order.id.clone(), reopened));
                }
                Ok(None) => {}
                Err(e) => {
                    self.notifier.report_error(level, &e).await;
                    report.failures.push((order.id.clone(), e));
                }
            }
        }
        report
    }

    async fn sweep_one(
        &self,
        order: &Order,
        side: OrderSide,
        level: NotifyLevel,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, EngineError> {
        let opened_at = order
            .created_time()
            .with_context(|| format!("parse creation time of order {}", order.id))?;
        if now - opened_at < self.max_age {
            return Ok(None);
        }

        let market = order.market_name(self.version);
        let message = format!(
            "Cancelling (and reopening) limit {side} {} (market: {market}, price: {}, qty: {}, opened at {}) because it is older than {} days.",
            order.id,
            order.price().normalize(),
            order.quantity.normalize(),
            order.created_at,
            self.max_age.num_days(),
        );
        info!(order_id = %order.id, market = %market, "{message}");
        self.notifier
            .notify(level, Notification::new(MessageKind::Info, self.notifier.title("INFO"), message))
            .await;

        let context = || format!("reopen order {}", order.id);
        let trigger = self.composer.cancel(order).await.with_context(context)?;
        let reopened = match trigger {
            Some(stop) if stop > Decimal::ZERO => {
                self.composer
                    .place_oco(&market, order.quantity, order.price(), stop)
                    .await
                    .with_context(context)?
                    .sell
            }
            _ => self
                .composer
                .place(side, &market, order.quantity, order.price(), OrderType::Limit)
                .await
                .with_context(context)?,
        };
        Ok(Some(reopened))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ExchangeError;
    use crate::application::services::notifier::fakes::RecordingNotifier;
    use crate::domain::market::fixtures::market;
    use crate::domain::order_lifecycle::aggregate::format_exchange_time;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::exchange::PaperExchange;
    use rust_decimal_macros::dec;

    struct Harness {
        exchange: Arc<PaperExchange>,
        backend: Arc<RecordingNotifier>,
        composer: Arc<OrderComposer<PaperExchange>>,
        use_case: SweepStaleOrdersUseCase<PaperExchange>,
    }

    fn harness() -> Harness {
        let exchange = Arc::new(PaperExchange::new(vec![market("ETH", "BTC", 2)]));
        exchange.set_ticker("ETH-BTC", dec!(100));
        let backend = Arc::new(RecordingNotifier::default());
        let notifier = Arc::new(Notifier::new(backend.clone(), Arc::new(ManualClock::default()), "Paper"));
        let composer = Arc::new(OrderComposer::new(exchange.clone(), ApiVersion::V3));
        Harness {
            use_case: SweepStaleOrdersUseCase::new(
                composer.clone(),
                notifier,
                Duration::days(DEFAULT_MAX_ORDER_AGE_DAYS),
                ApiVersion::V3,
            ),
            exchange,
            backend,
            composer,
        }
    }

    fn aged(mut order: Order, now: DateTime<Utc>, days: i64) -> Order {
        order.created_at = format_exchange_time(now - Duration::days(days));
        order
    }

    #[tokio::test]
    async fn old_limit_order_is_reopened_identically() {
        let h = harness();
        let now = Utc::now();
        let sell = h.exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(2), dec!(120));
        let open: OrderSnapshot = vec![aged(sell.clone(), now, 22)].into();

        let report = h.use_case.execute(&open, NotifyLevel::Default, now).await;
        assert!(report.failures.is_empty());
        let (old_id, reopened) = &report.reopened[0];
        assert_eq!(old_id, &sell.id);
        assert_ne!(reopened.id, sell.id);
        assert_eq!(reopened.side(), Some(OrderSide::Sell));
        assert_eq!(reopened.quantity, dec!(2));
        assert_eq!(reopened.limit, Some(dec!(120)));
        assert_eq!(h.exchange.open_order_count(), 1);
        assert_eq!(h.backend.titles(), vec!["Paper - INFO"]);
    }

    #[tokio::test]
    async fn young_orders_are_left_alone() {
        let h = harness();
        let now = Utc::now();
        let sell = h.exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(2), dec!(120));
        let open: OrderSnapshot = vec![aged(sell, now, 20)].into();

        let report = h.use_case.execute(&open, NotifyLevel::Default, now).await;
        assert!(report.reopened.is_empty());
        assert!(h.backend.sent().is_empty());
    }

    #[tokio::test]
    async fn protected_sell_is_reopened_as_oco() {
        let h = harness();
        let now = Utc::now();
        let placed = h.composer.place_oco("ETH-BTC", dec!(2), dec!(120), dec!(90)).await.unwrap();
        let open: OrderSnapshot = vec![aged(placed.sell, now, 30)].into();

        let report = h.use_case.execute(&open, NotifyLevel::Off, now).await;
        let (_, reopened) = &report.reopened[0];
        let conditionals = h.exchange.open_conditional_orders("ETH-BTC").await.unwrap();
        assert_eq!(conditionals.len(), 1);
        assert!(conditionals[0].references(&reopened.id));
        assert_eq!(conditionals[0].trigger_price, dec!(90));
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_sweep() {
        let h = harness();
        let now = Utc::now();
        let first = h.exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(80));
        let second = h.exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(70));
        let mut broken = aged(first, now, 25);
        broken.created_at = "not a time".to_string();
        let open: OrderSnapshot = vec![broken, aged(second, now, 25)].into();

        let report = h.use_case.execute(&open, NotifyLevel::Default, now).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.reopened.len(), 1);
        assert!(h.backend.titles().contains(&"Paper - ERROR".to_string()));
    }

    #[tokio::test]
    async fn cancel_failure_is_reported() {
        let h = harness();
        let now = Utc::now();
        let sell = h.exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(2), dec!(120));
        h.exchange.fail_next_query(ExchangeError::Transport {
            message: "reset".to_string(),
        });
        let open: OrderSnapshot = vec![aged(sell, now, 22)].into();

        let report = h.use_case.execute(&open, NotifyLevel::Off, now).await;
        assert_eq!(report.failures.len(), 1);
        assert_eq!(h.exchange.open_order_count(), 1);
    }
}
