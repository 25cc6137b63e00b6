//! Order Composer
//!
//! Turns side/type/size/price tuples into exchange requests and builds the
//! two-call OCO pair. Market names arrive in the configured API convention and
//! are converted to V3 symbols here.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{error, info};

use crate::application::ports::{ExchangeError, ExchangePort, OrderScope};
use crate::domain::order_lifecycle::{
    ConditionalOrder, NewConditionalOrder, NewOrder, Order, OrderSide, OrderType,
};
use crate::domain::shared::{ApiVersion, MarketPair};
use crate::observability::record_order_placed;

/// Result of placing an OCO pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcoPlacement {
    /// Protective limit sell.
    pub sell: Order,
    /// Stop leg, absent when the sell filled before it could be attached.
    pub conditional: Option<ConditionalOrder>,
}

/// Builds and places orders.
pub struct OrderComposer<E: ExchangePort> {
    exchange: Arc<E>,
    version: ApiVersion,
}

impl<E: ExchangePort> OrderComposer<E> {
    /// Create a composer for market names written in `version` convention.
    pub const fn new(exchange: Arc<E>, version: ApiVersion) -> Self {
        Self { exchange, version }
    }

    /// V3 symbol for a market name in the configured convention.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::UnknownMarket`] for names that cannot be parsed.
    pub fn exchange_symbol(&self, market: &str) -> Result<String, ExchangeError> {
        MarketPair::convert(market, self.version, ApiVersion::V3).map_err(|_| {
            ExchangeError::UnknownMarket {
                market: market.to_string(),
            }
        })
    }

    /// Build the request without sending it.
    pub fn compose(
        &self,
        side: OrderSide,
        market: &str,
        size: Decimal,
        price: Decimal,
        kind: OrderType,
    ) -> Result<NewOrder, ExchangeError> {
        Ok(NewOrder::from_parts(
            self.exchange_symbol(market)?,
            side,
            kind,
            size,
            price,
        ))
    }

    /// Place a single order.
    pub async fn place(
        &self,
        side: OrderSide,
        market: &str,
        size: Decimal,
        price: Decimal,
        kind: OrderType,
    ) -> Result<Order, ExchangeError> {
        let request = self.compose(side, market, size, price, kind)?;
        let order = self.exchange.create_order(&request).await?;
        record_order_placed(
            &side.as_str().to_ascii_lowercase(),
            &request.order_type.to_string().to_ascii_lowercase(),
        );
        info!(
            order_id = %order.id,
            market = %request.market_symbol,
            side = %side,
            size = %size,
            price = %price,
            "Order placed"
        );
        Ok(order)
    }

    /// Place a protective limit sell and attach a stop-loss leg to it.
    ///
    /// If the conditional leg is rejected because the sell already filled,
    /// the rejection is logged and the sell is returned unpaired.
    ///
    /// # Errors
    ///
    /// Any other failure is returned. A failure on the conditional leg leaves
    /// the limit sell live.
    pub async fn place_oco(
        &self,
        market: &str,
        size: Decimal,
        price: Decimal,
        stop: Decimal,
    ) -> Result<OcoPlacement, ExchangeError> {
        let sell = self
            .place(OrderSide::Sell, market, size, price, OrderType::Limit)
            .await?;

        let request = NewConditionalOrder::stop_loss(sell.market_symbol.clone(), size, stop, sell.id.clone());
        match self.exchange.create_conditional_order(&request).await {
            Ok(conditional) => {
                record_order_placed("sell", "conditional");
                info!(
                    order_id = %sell.id,
                    conditional_id = %conditional.id,
                    stop = %stop,
                    "Stop-loss attached"
                );
                Ok(OcoPlacement {
                    sell,
                    conditional: Some(conditional),
                })
            }
            Err(e @ ExchangeError::InvalidCancelOrder { .. }) => {
                error!(order_id = %sell.id, error = %e, "Limit sell filled before stop-loss could be attached");
                Ok(OcoPlacement {
                    sell,
                    conditional: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Cancel an order together with any conditional order protecting it.
    ///
    /// Returns the trigger price of the cancelled conditional order, if any.
    pub async fn cancel(&self, order: &Order) -> Result<Option<Decimal>, ExchangeError> {
        let conditionals = self
            .exchange
            .open_conditional_orders(&order.market_symbol)
            .await?;

        let mut trigger_price = None;
        for conditional in conditionals.iter().filter(|c| c.references(&order.id)) {
            trigger_price = Some(conditional.trigger_price);
            self.exchange.cancel_conditional_order(&conditional.id).await?;
        }

        self.exchange.cancel_order(&order.id).await?;
        info!(order_id = %order.id, market = %order.market_symbol, "Order cancelled");
        Ok(trigger_price)
    }

    /// Cancel every open order of `side` in `market`. Returns how many were cancelled.
    pub async fn cancel_side(&self, market: &str, side: OrderSide) -> Result<usize, ExchangeError> {
        let symbol = self.exchange_symbol(market)?;
        let orders = self
            .exchange
            .open_orders(&OrderScope::Market(symbol))
            .await?;

        let mut cancelled = 0;
        for order in orders.iter().filter(|o| o.direction.is(side)) {
            self.exchange.cancel_order(&order.id).await?;
            cancelled += 1;
        }
        Ok(cancelled)
    }
}
