//! Maintain Buy Ladder Use Case
//!
//! Reconciles a set of target buy levels against the open buy orders of one
//! market. Levels already covered by an open buy of the same price and size
//! are left alone.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use super::{Context, EngineError};
use crate::application::ports::{ExchangeError, ExchangePort, OrderScope};
use crate::application::services::{MarketCache, OrderComposer};
use crate::domain::order_lifecycle::{Order, OrderSide, OrderSnapshot, OrderType};
use crate::domain::shared::OrderId;
use crate::domain::strategy::{BuyCall, plan_ladder};

/// What to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderRequest {
    /// Market name in the configured convention.
    pub market: String,
    /// Target levels.
    pub calls: Vec<BuyCall>,
    /// Size per level.
    pub size: Decimal,
    /// Price factor applied to each level; `1` places at the level price.
    pub deviation: Decimal,
    /// Order type for each level.
    pub kind: OrderType,
    /// Cancel open buys that do not match a level first.
    pub cancel: bool,
}

/// Outcome of a ladder run.
#[derive(Debug, Clone, Default)]
pub struct LadderReport {
    /// Open buys cancelled.
    pub cancelled: Vec<OrderId>,
    /// Levels skipped because an open buy already matched.
    pub skipped: Vec<Decimal>,
    /// Orders placed.
    pub placed: Vec<Order>,
    /// Size used after a minimum-size retry.
    pub retried_with_size: Option<Decimal>,
}

/// Use case for maintaining a buy ladder.
pub struct MaintainBuyLadderUseCase<E: ExchangePort> {
    exchange: Arc<E>,
    composer: Arc<OrderComposer<E>>,
    markets: Arc<MarketCache<E>>,
}

impl<E: ExchangePort> MaintainBuyLadderUseCase<E> {
    /// Create a new `MaintainBuyLadderUseCase`.
    pub const fn new(exchange: Arc<E>, composer: Arc<OrderComposer<E>>, markets: Arc<MarketCache<E>>) -> Self {
        Self {
            exchange,
            composer,
            markets,
        }
    }

    /// Reconcile and place the ladder.
    ///
    /// If a level is rejected for falling below the market minimum, the whole
    /// batch is run once more with the market's minimum size.
    ///
    /// # Errors
    ///
    /// Returns the first failure that the minimum-size retry does not cover.
    pub async fn execute(&self, request: &LadderRequest) -> Result<LadderReport, EngineError> {
        let mut report = LadderReport::default();
        match self.run(request, request.size, &mut report).await {
            Err(ExchangeError::MinTradeRequirementNotMet { message }) => {
                let minimum = self
                    .markets
                    .min_trade_size(&request.market)
                    .await
                    .with_context(|| format!("look up minimum size of {}", request.market))?;
                let Some(minimum) = minimum else {
                    return Err(ExchangeError::MinTradeRequirementNotMet { message })
                        .with_context(|| format!("buy {} in {}", request.size, request.market));
                };
                warn!(market = %request.market, size = %request.size, minimum = %minimum, "Below minimum trade size, retrying with market minimum");
                report.retried_with_size = Some(minimum);
                self.run(request, minimum, &mut report)
                    .await
                    .with_context(|| format!("buy {minimum} in {}", request.market))?;
                Ok(report)
            }
            Err(e) => Err(e).with_context(|| format!("buy {} in {}", request.size, request.market)),
            Ok(()) => Ok(report),
        }
    }

    async fn run(&self, request: &LadderRequest, size: Decimal, report: &mut LadderReport) -> Result<(), ExchangeError> {
        let mut calls = request.calls.clone();

        if request.cancel {
            let symbol = self.composer.exchange_symbol(&request.market)?;
            let open: OrderSnapshot = self.exchange.open_orders(&OrderScope::Market(symbol)).await?.into();
            let plan = plan_ladder(&calls, size, &open);
            for id in &plan.cancel {
                self.exchange.cancel_order(id).await?;
                report.cancelled.push(id.clone());
            }
            calls = plan.calls;
        }

        let deviating = request.deviation != Decimal::ONE;
        let (ticker, price_precision) = if deviating {
            let symbol = self.composer.exchange_symbol(&request.market)?;
            (
                self.exchange.ticker(&symbol).await?.last_trade_rate,
                self.markets.price_precision(&request.market).await?,
            )
        } else {
            (Decimal::ZERO, 0)
        };

        for call in &calls {
            if call.skip {
                info!(market = %request.market, price = %call.price, "Buy level already open");
                report.skipped.push(call.price);
                continue;
            }
            let (kind, limit) = if deviating {
                call.deviate(request.kind, request.deviation, ticker, price_precision)
            } else {
                (request.kind, call.price)
            };
            let order = self
                .composer
                .place(OrderSide::Buy, &request.market, size, limit, kind)
                .await?;
            report.placed.push(order);
        }
        Ok(())
    }
}
