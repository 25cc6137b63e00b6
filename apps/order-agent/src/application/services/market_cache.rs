//! Market Cache
//!
//! In-memory copy of the exchange's market list. Lookups use the cached list
//! and refresh it on demand, which covers markets listed after start-up.

use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use crate::application::ports::{ExchangeError, ExchangePort};
use crate::domain::market::{DEFAULT_PRICE_PRECISION, Market, SIZE_PRECISION};
use crate::domain::shared::{ApiVersion, MarketPair};

/// Cached market metadata.
pub struct MarketCache<E: ExchangePort> {
    exchange: Arc<E>,
    version: ApiVersion,
    markets: RwLock<Option<Vec<Market>>>,
}

impl<E: ExchangePort> MarketCache<E> {
    /// Create an empty cache. Market names are written in `version` convention.
    pub const fn new(exchange: Arc<E>, version: ApiVersion) -> Self {
        Self {
            exchange,
            version,
            markets: RwLock::new(None),
        }
    }

    /// Naming convention of market names passed to this cache.
    #[must_use]
    pub const fn version(&self) -> ApiVersion {
        self.version
    }

    async fn all(&self, cached: bool) -> Result<Vec<Market>, ExchangeError> {
        if cached {
            let snapshot = self.markets.read().clone();
            if let Some(markets) = snapshot {
                return Ok(markets);
            }
        }
        let markets = self.exchange.markets().await?;
        info!(count = markets.len(), "Market list refreshed");
        *self.markets.write() = Some(markets.clone());
        Ok(markets)
    }

    /// Online markets, from cache when `cached` and a copy exists.
    pub async fn markets(&self, cached: bool) -> Result<Vec<Market>, ExchangeError> {
        Ok(self
            .all(cached)
            .await?
            .into_iter()
            .filter(Market::is_online)
            .collect())
    }

    async fn find(&self, market: &str, cached: bool, online_only: bool) -> Result<Option<Market>, ExchangeError> {
        let Ok(pair) = MarketPair::parse(market, self.version) else {
            return Ok(None);
        };
        Ok(self
            .all(cached)
            .await?
            .into_iter()
            .find(|m| m.pair() == pair && (!online_only || m.is_online())))
    }

    /// Base/quote pair of an online market.
    ///
    /// An unknown name triggers one refresh of the cached list before the
    /// lookup fails.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::UnknownMarket`] if the market is not listed
    /// after the refresh.
    pub async fn resolve(&self, market: &str) -> Result<MarketPair, ExchangeError> {
        if let Some(found) = self.find(market, true, true).await? {
            return Ok(found.pair());
        }
        self.find(market, false, true)
            .await?
            .map(|found| found.pair())
            .ok_or_else(|| ExchangeError::UnknownMarket {
                market: market.to_string(),
            })
    }

    /// Decimal places for prices. Unknown markets get a default of 8.
    pub async fn price_precision(&self, market: &str) -> Result<u32, ExchangeError> {
        Ok(self
            .find(market, true, false)
            .await?
            .map_or(DEFAULT_PRICE_PRECISION, |m| m.precision))
    }

    /// Decimal places for sizes.
    #[must_use]
    pub const fn size_precision(&self, _market: &str) -> u32 {
        SIZE_PRECISION
    }

    /// Minimum order size, read from a fresh market list.
    pub async fn min_trade_size(&self, market: &str) -> Result<Option<Decimal>, ExchangeError> {
        Ok(self.find(market, false, false).await?.map(|m| m.min_trade_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::fixtures::market;
    use crate::infrastructure::exchange::PaperExchange;

    fn cache(markets: Vec<Market>) -> (MarketCache<PaperExchange>, Arc<PaperExchange>) {
        let exchange = Arc::new(PaperExchange::new(markets));
        (MarketCache::new(exchange.clone(), ApiVersion::Legacy), exchange)
    }

    #[tokio::test]
    async fn offline_markets_are_hidden() {
        let mut offline = market("LTC", "BTC", 8);
        offline.status = "OFFLINE".to_string();
        let (cache, _) = cache(vec![market("ETH", "BTC", 6), offline]);
        let markets = cache.markets(true).await.unwrap();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].symbol, "ETH-BTC");
    }

    #[tokio::test]
    async fn resolve_refreshes_once_for_new_listing() {
        let (cache, exchange) = cache(vec![market("ETH", "BTC", 6)]);
        cache.markets(true).await.unwrap();
        exchange.list_market(market("NEW", "BTC", 4));

        let pair = cache.resolve("BTC-NEW").await.unwrap();
        assert_eq!(pair, MarketPair::new("NEW", "BTC"));
    }

    #[tokio::test]
    async fn resolve_fails_for_unlisted_market() {
        let (cache, _) = cache(vec![market("ETH", "BTC", 6)]);
        let err = cache.resolve("BTC-XYZ").await.unwrap_err();
        assert!(matches!(err, ExchangeError::UnknownMarket { .. }));
    }

    #[tokio::test]
    async fn precision_defaults_to_eight() {
        let (cache, _) = cache(vec![market("ETH", "BTC", 6)]);
        assert_eq!(cache.price_precision("BTC-ETH").await.unwrap(), 6);
        assert_eq!(cache.price_precision("BTC-XYZ").await.unwrap(), 8);
        assert_eq!(cache.size_precision("BTC-ETH"), 8);
    }
}
