//! End-to-end trading loop scenarios.
//!
//! Runs the full stack (config, governed paper exchange, in-memory session,
//! use cases, trading loop) on a manual clock.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use rust_decimal_macros::dec;

use order_agent::application::ports::{FixedSettings, Notification, NotifierPort, NotifyError};
use order_agent::application::services::{
    MarketCache, Notifier, OrderComposer, RequestGovernor, TradingLoop, TradingLoopConfig,
};
use order_agent::application::use_cases::{
    DetectOpenOrdersUseCase, ProcessFillsUseCase, SweepStaleOrdersUseCase,
};
use order_agent::config::{Config, load_config_from_string};
use order_agent::domain::order_lifecycle::{OrderSide, OrderType};
use order_agent::infrastructure::clock::ManualClock;
use order_agent::infrastructure::exchange::{GovernedExchange, PaperExchange};
use order_agent::infrastructure::session::{InMemorySessionLock, InMemorySessionStore};

type Exchange = GovernedExchange<PaperExchange>;

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotifierPort for Recorder {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().push(notification.clone());
        Ok(())
    }
}

impl Recorder {
    fn titles(&self) -> Vec<String> {
        self.sent.lock().iter().map(|n| n.title.clone()).collect()
    }
}

struct Agent {
    trading: TradingLoop<Exchange>,
    exchange: Arc<Exchange>,
    clock: Arc<ManualClock>,
    recorder: Arc<Recorder>,
}

impl Agent {
    fn paper(&self) -> &PaperExchange {
        self.exchange.inner()
    }
}

fn config(strategy: &str) -> Config {
    let yaml = format!(
        r#"
exchange:
  name: Paper
  api_version: v3
strategy:
{strategy}
notifications:
  level: verbose
paper:
  markets:
    - base: ETH
      quote: BTC
      ticker: "100"
      precision: 2
"#
    );
    load_config_from_string(&yaml).unwrap()
}

fn agent(config: &Config) -> Agent {
    let clock = Arc::new(ManualClock::default());
    let paper = PaperExchange::with_clock(
        config.paper.markets.iter().map(|m| m.market()).collect(),
        clock.clone(),
    );
    for market in &config.paper.markets {
        paper.set_ticker(&market.symbol(), market.ticker);
    }
    let governor = RequestGovernor::new(
        Arc::new(InMemorySessionStore::default()),
        Arc::new(InMemorySessionLock::default()),
        clock.clone(),
    );
    let exchange = Arc::new(GovernedExchange::new(paper, Arc::new(governor)));

    let version = config.exchange.api_version;
    let recorder = Arc::new(Recorder::default());
    let notifier = Arc::new(Notifier::new(recorder.clone(), clock.clone(), config.exchange.name.clone()));
    let composer = Arc::new(OrderComposer::new(exchange.clone(), version));
    let markets = Arc::new(MarketCache::new(exchange.clone(), version));

    let fills = ProcessFillsUseCase::new(
        exchange.clone(),
        composer.clone(),
        markets,
        notifier.clone(),
        config.strategy.to_strategy(version).unwrap(),
        version,
    );
    let opens = DetectOpenOrdersUseCase::new(exchange.clone(), notifier.clone());
    let sweeper = SweepStaleOrdersUseCase::new(
        composer,
        notifier.clone(),
        ChronoDuration::days(config.sweeper.max_order_age_days),
        version,
    );
    let trading = TradingLoop::new(
        exchange.clone(),
        fills,
        opens,
        sweeper,
        Arc::new(FixedSettings(config.dynamic_settings().unwrap())),
        notifier,
        clock.clone(),
        TradingLoopConfig {
            poll_interval: std::time::Duration::ZERO,
            sweep_interval: ChronoDuration::seconds(config.sweeper.interval_secs),
        },
    );

    Agent {
        trading,
        exchange,
        clock,
        recorder,
    }
}

#[tokio::test]
async fn filled_buy_gets_a_take_profit_sell() {
    let mut agent = agent(&config("  kind: standard"));
    let buy = agent
        .paper()
        .rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(10), dec!(100));
    agent.trading.start().await.unwrap();

    agent.paper().fill(&buy.id).unwrap();
    let iteration = agent.trading.run_iteration().await;

    assert!(iteration.error.is_none(), "{:?}", iteration.error);
    assert_eq!(iteration.reactions.len(), 1);
    let sell = &iteration.reactions[0].placed[0];
    assert_eq!(sell.side(), Some(OrderSide::Sell));
    assert_eq!(sell.order_type, OrderType::Limit);
    assert_eq!(sell.quantity, dec!(10));
    assert_eq!(sell.limit, Some(dec!(105.00)));
    assert!(iteration.reactions[0].conditional.is_none());
    assert_eq!(iteration.opened.len(), 1);
    assert!(agent.recorder.titles().contains(&"Paper - Done BUY".to_string()));
}

#[tokio::test]
async fn filled_buy_gets_an_oco_pair_under_stop_loss() {
    let mut agent = agent(&config("  kind: stop_loss"));
    let buy = agent
        .paper()
        .rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(10), dec!(100));
    agent.trading.start().await.unwrap();

    agent.paper().fill(&buy.id).unwrap();
    let iteration = agent.trading.run_iteration().await;

    assert!(iteration.error.is_none(), "{:?}", iteration.error);
    let reaction = &iteration.reactions[0];
    assert_eq!(reaction.placed[0].limit, Some(dec!(105.00)));
    let stop = reaction.conditional.as_ref().unwrap();
    assert_eq!(stop.trigger_price, dec!(95.00));
    assert_eq!(
        stop.order_to_cancel.as_ref().map(|c| c.id.clone()),
        Some(reaction.placed[0].id.clone())
    );
}

#[tokio::test]
async fn stop_loss_fill_rebuys_with_dca_through_self_trade() {
    let mut agent = agent(&config("  kind: stop_loss\n  dca: true"));
    let buy = agent
        .paper()
        .rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(5), dec!(100));
    agent.trading.start().await.unwrap();

    agent.paper().fill(&buy.id).unwrap();
    let first = agent.trading.run_iteration().await;
    assert!(first.error.is_none(), "{:?}", first.error);
    assert!(first.reactions[0].conditional.is_some());

    // The stop fires, cancelling the take-profit and selling 5 at market.
    let closed = agent.paper().move_price("ETH-BTC", dec!(94));
    assert_eq!(closed.len(), 1);
    assert!(closed[0].is_market());
    let blocker = agent
        .paper()
        .rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(3), dec!(90));

    let second = agent.trading.run_iteration().await;

    assert!(second.error.is_none(), "{:?}", second.error);
    let reaction = &second.reactions[0];
    assert_eq!(reaction.cancelled, vec![blocker.id]);
    assert_eq!(reaction.placed[0].side(), Some(OrderSide::Buy));
    assert_eq!(reaction.placed[0].quantity, dec!(14.0));
    assert_eq!(agent.paper().attempted_buy_sizes(), vec![dec!(11.0), dec!(14.0)]);
    assert!(agent.recorder.titles().contains(&"Paper - Done SELL -5.00%".to_string()));
}

#[tokio::test]
async fn stale_order_is_reopened_by_the_sweep() {
    let mut agent = agent(&config("  kind: standard"));
    let stale = agent
        .paper()
        .rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(2), dec!(90));
    agent.trading.start().await.unwrap();

    agent.clock.advance(std::time::Duration::from_secs(22 * 24 * 3600));
    let iteration = agent.trading.run_iteration().await;

    let sweep = iteration.sweep.unwrap();
    assert!(sweep.failures.is_empty(), "{:?}", sweep.failures);
    assert_eq!(sweep.reopened.len(), 1);
    let (old_id, replacement) = &sweep.reopened[0];
    assert_eq!(old_id, &stale.id);
    assert_ne!(replacement.id, stale.id);
    assert_eq!(replacement.side(), Some(OrderSide::Buy));
    assert_eq!(replacement.quantity, dec!(2));
    assert_eq!(replacement.price(), dec!(90));
    assert_eq!(agent.paper().open_order_count(), 1);

    let next = agent.trading.run_iteration().await;
    assert_eq!(next.opened.len(), 1);
    assert!(next.sweep.is_none());
}

#[tokio::test]
async fn young_orders_survive_the_sweep() {
    let mut agent = agent(&config("  kind: standard"));
    agent
        .paper()
        .rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(2), dec!(90));
    agent.trading.start().await.unwrap();

    agent.clock.advance(std::time::Duration::from_secs(20 * 24 * 3600));
    let iteration = agent.trading.run_iteration().await;

    let sweep = iteration.sweep.unwrap();
    assert!(sweep.reopened.is_empty());
    assert!(agent.paper().attempted_buy_sizes().is_empty());
}

#[tokio::test]
async fn exchange_calls_are_paced_by_the_governor() {
    let mut agent = agent(&config("  kind: standard"));
    agent.trading.start().await.unwrap();

    agent.trading.run_iteration().await;
    agent.trading.run_iteration().await;

    let sleeps = agent.clock.sleeps();
    assert!(!sleeps.is_empty());
    assert!(sleeps.iter().all(|s| *s > std::time::Duration::ZERO));
}
