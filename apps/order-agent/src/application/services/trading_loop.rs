//! Trading Loop
//!
//! The long-running scheduler. Each iteration re-reads the dynamic settings,
//! processes fills, detects open/cancelled orders and, once per sweep
//! interval, reopens stale orders. Any failure is reported and the rest of
//! the iteration is skipped; the loop itself never stops on an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ports::{Clock, ExchangePort, Notification, OrderScope, SettingsPort};
use crate::application::services::Notifier;
use crate::application::use_cases::{
    Context, DetectOpenOrdersUseCase, EngineError, FillReaction, ProcessFillsUseCase, SweepReport,
    SweepStaleOrdersUseCase,
};
use crate::domain::order_lifecycle::{Order, OrderSnapshot, SnapshotStore};
use crate::domain::strategy::{DynamicSettings, MessageKind};
use crate::observability::record_loop_error;

/// Default time between sweeps for stale orders.
pub const DEFAULT_SWEEP_INTERVAL_SECS: i64 = 3600;

/// Scheduler timing.
#[derive(Debug, Clone, Copy)]
pub struct TradingLoopConfig {
    /// Pause between iterations. Zero relies on the governor for pacing.
    pub poll_interval: Duration,
    /// Minimum time between stale-order sweeps.
    pub sweep_interval: chrono::Duration,
}

impl Default for TradingLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            sweep_interval: chrono::Duration::seconds(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

/// What one iteration did.
#[derive(Debug, Default)]
pub struct Iteration {
    /// Reactions to fills.
    pub reactions: Vec<FillReaction>,
    /// Orders that disappeared without filling.
    pub cancelled: Vec<Order>,
    /// Newly opened orders.
    pub opened: Vec<Order>,
    /// Sweep outcome, when a sweep was due.
    pub sweep: Option<SweepReport>,
    /// The failure that ended the iteration early.
    pub error: Option<EngineError>,
}

/// The trading loop and the state it carries between iterations.
pub struct TradingLoop<E: ExchangePort> {
    exchange: Arc<E>,
    fills: ProcessFillsUseCase<E>,
    opens: DetectOpenOrdersUseCase<E>,
    sweeper: SweepStaleOrdersUseCase<E>,
    settings: Arc<dyn SettingsPort>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    config: TradingLoopConfig,
    store: SnapshotStore,
    current: DynamicSettings,
    last_sweep: DateTime<Utc>,
}

impl<E: ExchangePort> TradingLoop<E> {
    /// Create a loop. Call [`Self::start`] before iterating.
    pub fn new(
        exchange: Arc<E>,
        fills: ProcessFillsUseCase<E>,
        opens: DetectOpenOrdersUseCase<E>,
        sweeper: SweepStaleOrdersUseCase<E>,
        settings: Arc<dyn SettingsPort>,
        notifier: Arc<Notifier>,
        clock: Arc<dyn Clock>,
        config: TradingLoopConfig,
    ) -> Self {
        let last_sweep = clock.now();
        Self {
            exchange,
            fills,
            opens,
            sweeper,
            settings,
            notifier,
            clock,
            config,
            store: SnapshotStore::default(),
            current: DynamicSettings::default(),
            last_sweep,
        }
    }

    /// Snapshots as of the last completed steps.
    #[must_use]
    pub const fn snapshots(&self) -> &SnapshotStore {
        &self.store
    }

    /// Record the initial history and open orders, so orders that exist
    /// before start-up are never treated as new, then announce the start.
    ///
    /// # Errors
    ///
    /// Returns an error if either snapshot cannot be fetched.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        let history: OrderSnapshot = self
            .exchange
            .order_history(&OrderScope::All)
            .await
            .context("fetch initial order history")?
            .into();
        let open: OrderSnapshot = self
            .exchange
            .open_orders(&OrderScope::All)
            .await
            .context("fetch initial open orders")?
            .into();

        info!(history = history.len(), open = open.len(), "Trading loop started");
        self.store = SnapshotStore::new(open, history);
        self.last_sweep = self.clock.now();

        if let Ok(settings) = self.settings.load().await {
            self.current = settings;
        }
        let title = self.notifier.title("INFO");
        self.notifier
            .notify(
                self.current.level,
                Notification::new(MessageKind::Info, title, "Trading loop started."),
            )
            .await;
        Ok(())
    }

    /// Run one pass over every step.
    pub async fn run_iteration(&mut self) -> Iteration {
        let mut iteration = Iteration::default();

        match self.settings.load().await {
            Ok(settings) => self.current = settings,
            Err(e) => {
                self.fail(&mut iteration, "settings", EngineError::from(e)).await;
                return iteration;
            }
        }
        let level = self.current.level;

        match self.fills.execute(&self.store.history, &self.current).await {
            Ok(pass) => {
                self.store.replace_history(pass.snapshot);
                iteration.reactions = pass.reactions;
                if let Some(e) = pass.failure {
                    self.fail(&mut iteration, "fills", e).await;
                    return iteration;
                }
            }
            Err(e) => {
                self.fail(&mut iteration, "fills", e).await;
                return iteration;
            }
        }

        match self.opens.execute(&self.store.open, &self.store.history, level).await {
            Ok(pass) => {
                self.store.replace_open(pass.snapshot);
                iteration.cancelled = pass.cancelled;
                iteration.opened = pass.opened;
            }
            Err(e) => {
                self.fail(&mut iteration, "open_orders", e).await;
                return iteration;
            }
        }

        let now = self.clock.now();
        if now - self.last_sweep > self.config.sweep_interval {
            let report = self.sweeper.execute(&self.store.open, level, now).await;
            for _ in &report.failures {
                record_loop_error("sweep");
            }
            self.last_sweep = self.clock.now();
            iteration.sweep = Some(report);
        }

        iteration
    }

    async fn fail(&self, iteration: &mut Iteration, step: &str, error: EngineError) {
        record_loop_error(step);
        self.notifier.report_error(self.current.level, &error).await;
        iteration.error = Some(error);
    }

    /// Iterate until `shutdown` is cancelled.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        while !shutdown.is_cancelled() {
            self.run_iteration().await;
            if self.config.poll_interval.is_zero() {
                // Governed calls already sleep; yield so shutdown is observed.
                tokio::task::yield_now().await;
                continue;
            }
            tokio::select! {
                () = self.clock.sleep(self.config.poll_interval) => {}
                () = shutdown.cancelled() => {}
            }
        }
        info!("Trading loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{FixedSettings, SettingsError};
    use crate::application::services::notifier::fakes::RecordingNotifier;
    use crate::application::services::{MarketCache, OrderComposer};
    use crate::application::use_cases::StrategyConfig;
    use crate::domain::market::fixtures::market;
    use crate::domain::order_lifecycle::{OrderSide, OrderType};
    use crate::domain::shared::ApiVersion;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::exchange::PaperExchange;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    struct FlakySettings {
        fail: Mutex<bool>,
    }

    #[async_trait]
    impl SettingsPort for FlakySettings {
        async fn load(&self) -> Result<DynamicSettings, SettingsError> {
            if *self.fail.lock() {
                return Err(SettingsError::Unavailable {
                    message: "config.yaml: permission denied".to_string(),
                });
            }
            Ok(DynamicSettings::default())
        }
    }

    struct Harness {
        exchange: Arc<PaperExchange>,
        recorder: Arc<RecordingNotifier>,
        clock: Arc<ManualClock>,
    }

    fn build(settings: Arc<dyn SettingsPort>) -> (TradingLoop<PaperExchange>, Harness) {
        let exchange = Arc::new(PaperExchange::new(vec![market("ETH", "BTC", 2)]));
        exchange.set_ticker("ETH-BTC", dec!(100));
        let recorder = Arc::new(RecordingNotifier::default());
        let clock = Arc::new(ManualClock::default());
        let notifier = Arc::new(Notifier::new(recorder.clone(), clock.clone(), "Paper"));
        let composer = Arc::new(OrderComposer::new(exchange.clone(), ApiVersion::V3));
        let markets = Arc::new(MarketCache::new(exchange.clone(), ApiVersion::V3));
        let fills = ProcessFillsUseCase::new(
            exchange.clone(),
            composer.clone(),
            markets,
            notifier.clone(),
            StrategyConfig::default(),
            ApiVersion::V3,
        );
        let opens = DetectOpenOrdersUseCase::new(exchange.clone(), notifier.clone());
        let sweeper = SweepStaleOrdersUseCase::new(composer, notifier.clone(), chrono::Duration::days(21), ApiVersion::V3);
        let trading = TradingLoop::new(
            exchange.clone(),
            fills,
            opens,
            sweeper,
            settings,
            notifier,
            clock.clone(),
            TradingLoopConfig::default(),
        );
        (
            trading,
            Harness {
                exchange,
                recorder,
                clock,
            },
        )
    }

    #[tokio::test]
    async fn existing_orders_are_not_new() {
        let (mut trading, h) = build(Arc::new(FixedSettings::default()));
        h.exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(90));
        trading.start().await.unwrap();
        assert_eq!(h.recorder.titles(), vec!["Paper - INFO".to_string()]);

        let iteration = trading.run_iteration().await;
        assert!(iteration.error.is_none());
        assert!(iteration.opened.is_empty());
        assert!(iteration.reactions.is_empty());
    }

    #[tokio::test]
    async fn buy_fill_places_take_profit_and_it_is_seen_as_open() {
        let (mut trading, h) = build(Arc::new(FixedSettings::default()));
        let buy = h.exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(90));
        trading.start().await.unwrap();

        h.exchange.set_ticker("ETH-BTC", dec!(90));
        h.exchange.fill(&buy.id).unwrap();
        let iteration = trading.run_iteration().await;
        assert_eq!(iteration.reactions.len(), 1);
        assert_eq!(iteration.reactions[0].placed[0].limit, Some(dec!(94.50)));
        assert_eq!(iteration.opened.len(), 1);
        assert!(iteration.cancelled.is_empty());
        assert!(trading.snapshots().history.contains(&buy.id));
    }

    #[tokio::test]
    async fn settings_failure_skips_iteration_and_notifies_once() {
        let settings = Arc::new(FlakySettings { fail: Mutex::new(false) });
        let (mut trading, h) = build(settings.clone());
        let buy = h.exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(90));
        trading.start().await.unwrap();

        *settings.fail.lock() = true;
        h.exchange.fill(&buy.id).unwrap();
        let first = trading.run_iteration().await;
        let second = trading.run_iteration().await;
        assert!(matches!(first.error, Some(EngineError::Settings(_))));
        assert!(second.error.is_some());
        assert!(first.reactions.is_empty());
        let errors = h.recorder.titles().into_iter().filter(|t| t == "Paper - ERROR").count();
        assert_eq!(errors, 1);

        *settings.fail.lock() = false;
        let recovered = trading.run_iteration().await;
        assert_eq!(recovered.reactions.len(), 1);
    }

    #[tokio::test]
    async fn sweep_runs_only_after_interval() {
        let (mut trading, h) = build(Arc::new(FixedSettings::default()));
        trading.start().await.unwrap();

        assert!(trading.run_iteration().await.sweep.is_none());
        h.clock.advance(Duration::from_secs(3601));
        assert!(trading.run_iteration().await.sweep.is_some());
        assert!(trading.run_iteration().await.sweep.is_none());
    }

    #[tokio::test]
    async fn history_failure_keeps_previous_snapshots() {
        let (mut trading, h) = build(Arc::new(FixedSettings::default()));
        h.exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(1), dec!(120));
        trading.start().await.unwrap();

        h.exchange.fail_next_query(crate::application::ports::ExchangeError::Transport {
            message: "connection reset".to_string(),
        });
        let iteration = trading.run_iteration().await;
        assert!(iteration.error.is_some());
        assert_eq!(trading.snapshots().open.len(), 1);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (mut trading, _h) = build(Arc::new(FixedSettings::default()));
        trading.start().await.unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        trading.run(shutdown).await;
    }
}
