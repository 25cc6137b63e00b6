//! Market Data
//!
//! Read-only market queries used by the agent and its operators: tickers,
//! 24h statistics, order book sides and per-market order listings.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use super::MarketCache;
use crate::application::ports::{ExchangeError, ExchangePort, OrderScope};
use crate::domain::market::{BookEntry, BookSide, Bucket, MarketSummary, OrderSummary, aggregate};
use crate::domain::shared::{ApiVersion, DomainError, MarketPair};

/// Order book depth requested from the exchange.
pub const BOOK_DEPTH: u32 = 500;

/// Market data failure.
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// The exchange call failed.
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    /// Exchange data could not be interpreted.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Market data queries.
pub struct MarketDataService<E: ExchangePort> {
    exchange: Arc<E>,
    markets: Arc<MarketCache<E>>,
}

impl<E: ExchangePort> MarketDataService<E> {
    /// Create a new `MarketDataService`.
    pub const fn new(exchange: Arc<E>, markets: Arc<MarketCache<E>>) -> Self {
        Self { exchange, markets }
    }

    fn version(&self) -> ApiVersion {
        self.markets.version()
    }

    fn symbol(&self, market: &str) -> Result<String, MarketDataError> {
        Ok(MarketPair::convert(market, self.version(), ApiVersion::V3)?)
    }

    /// Last trade price.
    pub async fn ticker(&self, market: &str) -> Result<Decimal, MarketDataError> {
        let symbol = self.symbol(market)?;
        Ok(self.exchange.ticker(&symbol).await?.last_trade_rate)
    }

    /// 24h high, low and volume.
    pub async fn stats(&self, market: &str) -> Result<MarketSummary, MarketDataError> {
        let symbol = self.symbol(market)?;
        Ok(self.exchange.market_summary(&symbol).await?)
    }

    /// One side of the order book.
    pub async fn book_side(&self, market: &str, side: BookSide) -> Result<Vec<BookEntry>, MarketDataError> {
        let symbol = self.symbol(market)?;
        let book = self.exchange.order_book(&symbol, BOOK_DEPTH).await?;
        Ok(book.side(side).to_vec())
    }

    /// Bids grouped into buckets of `step`, at the market's price precision.
    pub async fn aggregated_bids(&self, market: &str, step: Decimal) -> Result<Vec<Bucket>, MarketDataError> {
        let bids = self.book_side(market, BookSide::Bid).await?;
        let precision = self.markets.price_precision(market).await?;
        Ok(aggregate(&bids, step, precision))
    }

    /// Closed orders of one market.
    ///
    /// # Errors
    ///
    /// Fails on the first order with an unparseable timestamp.
    pub async fn closed_orders(&self, market: &str) -> Result<Vec<OrderSummary>, MarketDataError> {
        let symbol = self.symbol(market)?;
        let orders = self.exchange.order_history(&OrderScope::Market(symbol)).await?;
        let version = self.version();
        Ok(orders
            .iter()
            .map(|o| OrderSummary::closed(o, version))
            .collect::<Result<_, _>>()?)
    }

    /// Open orders of one market.
    pub async fn opened_orders(&self, market: &str) -> Result<Vec<OrderSummary>, MarketDataError> {
        let symbol = self.symbol(market)?;
        let orders = self.exchange.open_orders(&OrderScope::Market(symbol)).await?;
        let version = self.version();
        Ok(orders
            .iter()
            .map(|o| OrderSummary::opened(o, version))
            .collect::<Result<_, _>>()?)
    }

    /// Online markets whose base asset is a leveraged token.
    pub async fn leveraged_markets(&self) -> Result<Vec<String>, MarketDataError> {
        let version = self.version();
        Ok(self
            .markets
            .markets(true)
            .await?
            .iter()
            .filter(|m| m.pair().is_leveraged_token())
            .map(|m| m.name(version))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::fixtures::market;
    use crate::domain::order_lifecycle::{OrderSide, OrderType};
    use crate::infrastructure::exchange::PaperExchange;
    use rust_decimal_macros::dec;

    fn service() -> (MarketDataService<PaperExchange>, Arc<PaperExchange>) {
        let exchange = Arc::new(PaperExchange::new(vec![
            market("ETH", "BTC", 2),
            market("ETHBULL", "USDT", 4),
        ]));
        exchange.set_ticker("ETH-BTC", dec!(100));
        let markets = Arc::new(MarketCache::new(exchange.clone(), ApiVersion::V3));
        (MarketDataService::new(exchange.clone(), markets), exchange)
    }

    #[tokio::test]
    async fn ticker_reads_last_trade() {
        let (service, _) = service();
        assert_eq!(service.ticker("ETH-BTC").await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn bids_are_aggregated_from_resting_buys() {
        let (service, exchange) = service();
        exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(1), dec!(91.2));
        exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(2), dec!(90.9));
        exchange.rest(OrderSide::Buy, "ETH-BTC", OrderType::Limit, dec!(4), dec!(80));

        let buckets = service.aggregated_bids("ETH-BTC", dec!(5)).await.unwrap();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].size, dec!(3));
        assert_eq!(buckets[1].size, dec!(4));
        assert!(buckets[0].price > buckets[1].price);
    }

    #[tokio::test]
    async fn listings_use_configured_convention() {
        let exchange = Arc::new(PaperExchange::new(vec![market("ETH", "BTC", 2)]));
        exchange.set_ticker("ETH-BTC", dec!(100));
        let markets = Arc::new(MarketCache::new(exchange.clone(), ApiVersion::Legacy));
        let service = MarketDataService::new(exchange.clone(), markets);
        let resting = exchange.rest(OrderSide::Sell, "ETH-BTC", OrderType::Limit, dec!(1), dec!(120));

        let open = service.opened_orders("BTC-ETH").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].market, "BTC-ETH");
        assert_eq!(open[0].price, dec!(120));

        exchange.fill(&resting.id).unwrap();
        let closed = service.closed_orders("BTC-ETH").await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].side, Some(OrderSide::Sell));
    }

    #[tokio::test]
    async fn finds_leveraged_markets() {
        let (service, _) = service();
        assert_eq!(service.leveraged_markets().await.unwrap(), vec!["ETHBULL-USDT".to_string()]);
    }

    #[tokio::test]
    async fn unknown_symbol_format_is_rejected() {
        let (service, _) = service();
        assert!(matches!(service.ticker("ETHBTC").await, Err(MarketDataError::Domain(_))));
    }
}
