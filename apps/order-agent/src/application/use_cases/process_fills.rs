//! Process Fills Use Case
//!
//! Finds orders that are new in the closed history and runs the strategy's
//! reaction to each: a take-profit sell (or OCO pair) after a buy, and an
//! optional DCA re-buy after a stop-loss sell.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{Context, EngineError, order_json};
use crate::application::ports::{ExchangePort, Notification, OrderScope};
use crate::application::services::{MarketCache, Notifier, OrderComposer};
use crate::domain::order_lifecycle::services::detect_fills;
use crate::domain::order_lifecycle::{ConditionalOrder, Order, OrderSide, OrderSnapshot, OrderType};
use crate::domain::shared::{ApiVersion, OrderId, precision};
use crate::domain::strategy::{DCA_FACTOR, DynamicSettings, HoldSet, MessageKind, StrategyKind};
use crate::observability::record_order_filled;

/// Default bound on the self-trade recovery loop.
pub const DEFAULT_MAX_SELF_TRADE_RETRIES: u32 = 25;

/// Static strategy configuration.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    /// Strategy kind.
    pub kind: StrategyKind,
    /// Re-buy after a stop-loss fill.
    pub dca: bool,
    /// Markets that keep a reserve.
    pub hold: HoldSet,
    /// Maximum buy attempts in the self-trade recovery loop.
    pub max_self_trade_retries: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            kind: StrategyKind::Standard,
            dca: false,
            hold: HoldSet::default(),
            max_self_trade_retries: DEFAULT_MAX_SELF_TRADE_RETRIES,
        }
    }
}

/// What the engine did in response to one fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReaction {
    /// The filled order.
    pub order_id: OrderId,
    /// Orders placed in response.
    pub placed: Vec<Order>,
    /// Stop-loss leg attached to a placed sell.
    pub conditional: Option<ConditionalOrder>,
    /// Orders cancelled to make room for a re-buy.
    pub cancelled: Vec<OrderId>,
}

impl FillReaction {
    fn new(order_id: OrderId) -> Self {
        Self {
            order_id,
            placed: Vec::new(),
            conditional: None,
            cancelled: Vec::new(),
        }
    }
}

/// Outcome of one fill pass.
#[derive(Debug, Clone)]
pub struct FillPass {
    /// Freshly polled history; replaces the stored snapshot even on failure,
    /// so a failing fill is attempted once only.
    pub snapshot: OrderSnapshot,
    /// Reactions completed before any failure.
    pub reactions: Vec<FillReaction>,
    /// First per-order failure, which ended the pass.
    pub failure: Option<EngineError>,
}

/// Use case for reacting to filled orders.
pub struct ProcessFillsUseCase<E: ExchangePort> {
    exchange: Arc<E>,
    composer: Arc<OrderComposer<E>>,
    markets: Arc<MarketCache<E>>,
    notifier: Arc<Notifier>,
    strategy: StrategyConfig,
    version: ApiVersion,
}

impl<E: ExchangePort> ProcessFillsUseCase<E> {
    /// Create a new `ProcessFillsUseCase`.
    pub const fn new(
        exchange: Arc<E>,
        composer: Arc<OrderComposer<E>>,
        markets: Arc<MarketCache<E>>,
        notifier: Arc<Notifier>,
        strategy: StrategyConfig,
        version: ApiVersion,
    ) -> Self {
        Self {
            exchange,
            composer,
            markets,
            notifier,
            strategy,
            version,
        }
    }

    /// Poll the closed history and react to fills since `previous`.
    ///
    /// # Errors
    ///
    /// Returns an error if markets or history cannot be fetched; the caller
    /// keeps its previous snapshot. Per-order failures are reported in
    /// [`FillPass::failure`] instead.
    pub async fn execute(&self, previous: &OrderSnapshot, settings: &DynamicSettings) -> Result<FillPass, EngineError> {
        self.markets.markets(true).await.context("load markets")?;

        let snapshot: OrderSnapshot = self
            .exchange
            .order_history(&OrderScope::All)
            .await
            .context("fetch order history")?
            .into();

        let mut reactions = Vec::new();
        let mut failure = None;
        for event in detect_fills(previous, &snapshot) {
            match self.react(event.order(), settings).await {
                Ok(reaction) => reactions.push(reaction),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        Ok(FillPass {
            snapshot,
            reactions,
            failure,
        })
    }

    async fn react(&self, order: &Order, settings: &DynamicSettings) -> Result<FillReaction, EngineError> {
        info!(order_id = %order.id, order = %order_json(order), "[FILLED]");
        let mut reaction = FillReaction::new(order.id.clone());

        let Some(side) = order.side() else {
            record_order_filled("unknown");
            return Ok(reaction);
        };
        record_order_filled(&side.as_str().to_ascii_lowercase());

        let stopped_out =
            side == OrderSide::Sell && self.strategy.kind == StrategyKind::StopLoss && order.is_market();
        self.announce(order, side, stopped_out, settings).await;

        match side {
            OrderSide::Sell if stopped_out && self.strategy.dca => self.dca_rebuy(order, &mut reaction).await?,
            OrderSide::Sell => {}
            OrderSide::Buy => self.take_profit(order, settings, &mut reaction).await?,
        }
        Ok(reaction)
    }

    async fn announce(&self, order: &Order, side: OrderSide, stopped_out: bool, settings: &DynamicSettings) {
        if !settings.level.can_send(MessageKind::Filled) {
            return;
        }
        let mut title = self.notifier.title(&format!("Done {side}"));
        if side == OrderSide::Sell {
            let multiplier = if stopped_out {
                settings.stop_loss
            } else {
                settings.take_profit
            };
            title = format!("{title} {}", multiplier.format());
        }
        self.notifier
            .deliver(Notification::new(MessageKind::Filled, title, order_json(order)))
            .await;

        let market = order
            .pair()
            .map_or_else(|_| order.market_symbol.clone(), |pair| pair.to_string());
        self.notifier
            .post(&format!(
                "Done {side}. {market} priced at {} #{}",
                order.price().normalize(),
                self.notifier.exchange_name()
            ))
            .await;
    }

    /// Market buy of 2.2× the stopped-out size, cancelling the lowest own
    /// sell each time the buy would self-trade. A sell is only cancelled when
    /// another buy attempt remains.
    async fn dca_rebuy(&self, order: &Order, reaction: &mut FillReaction) -> Result<(), EngineError> {
        let market = order.market_name(self.version);
        let size_precision = self.markets.size_precision(&market);
        let attempts = self.strategy.max_self_trade_retries;
        let mut size = DCA_FACTOR * order.fill_quantity;

        for attempt_no in 1..=attempts {
            let attempt = precision::round(size, size_precision);
            match self
                .composer
                .place(OrderSide::Buy, &market, attempt, Decimal::ZERO, OrderType::Market)
                .await
            {
                Ok(buy) => {
                    reaction.placed.push(buy);
                    return Ok(());
                }
                Err(e) if e.is_self_trade() && attempt_no == attempts => {
                    warn!(market = %market, size = %attempt, error = %e, "DCA re-buy still self-trades on the last attempt");
                }
                Err(e) if e.is_self_trade() => {
                    warn!(market = %market, size = %attempt, "DCA re-buy would self-trade, cancelling lowest sell");
                    let lowest = self
                        .exchange
                        .open_orders(&OrderScope::Market(order.market_symbol.clone()))
                        .await
                        .with_context(|| format!("list open orders in {market}"))?
                        .into_iter()
                        .filter(|o| o.direction.is(OrderSide::Sell))
                        .min_by(|a, b| a.price().cmp(&b.price()));
                    let Some(lowest) = lowest else {
                        return Err::<(), _>(e).with_context(|| format!("DCA re-buy in {market} with no sell left to cancel"));
                    };
                    size += lowest.quantity;
                    self.composer
                        .cancel(&lowest)
                        .await
                        .with_context(|| format!("cancel sell {}", lowest.id))?;
                    reaction.cancelled.push(lowest.id);
                }
                Err(e) => {
                    return Err::<(), _>(e).with_context(|| format!("DCA re-buy of {attempt} in {market}"));
                }
            }
        }

        Err(EngineError::RetriesExhausted { market, attempts })
    }

    /// Limit sell (or OCO pair) at fill price × take-profit.
    async fn take_profit(
        &self,
        order: &Order,
        settings: &DynamicSettings,
        reaction: &mut FillReaction,
    ) -> Result<(), EngineError> {
        let context = || format!("take profit on order {}", order_json(order));
        let market = order.market_name(self.version);

        let mut bought = order.price();
        if bought.is_zero() {
            bought = self
                .exchange
                .ticker(&order.market_symbol)
                .await
                .with_context(context)?
                .last_trade_rate;
        }

        let pair = self.markets.resolve(&market).await.with_context(context)?;
        let price_precision = self.markets.price_precision(&market).await.with_context(context)?;
        let quantity = self.strategy.hold.sell_size(
            &pair,
            order.fill_quantity,
            settings.take_profit,
            self.markets.size_precision(&market),
        );
        if quantity <= Decimal::ZERO {
            info!(order_id = %order.id, market = %market, "Nothing to sell after hold");
            return Ok(());
        }

        let target = settings.take_profit.apply(bought, price_precision);
        match self.strategy.kind {
            StrategyKind::StopLoss => {
                let stop = settings.stop_loss.apply(bought, price_precision);
                let placed = self
                    .composer
                    .place_oco(&market, quantity, target, stop)
                    .await
                    .with_context(context)?;
                reaction.placed.push(placed.sell);
                reaction.conditional = placed.conditional;
            }
            StrategyKind::Standard => {
                let sell = self
                    .composer
                    .place(OrderSide::Sell, &market, quantity, target, OrderType::Limit)
                    .await
                    .with_context(context)?;
                reaction.placed.push(sell);
            }
        }
        Ok(())
    }
}
