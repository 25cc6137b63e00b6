//! Order book snapshots and aggregation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::precision;

/// Book side selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSide {
    /// Bids.
    Bid,
    /// Asks.
    Ask,
}

/// One price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    /// Quantity at this level.
    pub quantity: Decimal,
    /// Price of this level.
    pub rate: Decimal,
}

/// Both sides of a market's book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    /// Bids, best first.
    pub bid: Vec<BookEntry>,
    /// Asks, best first.
    pub ask: Vec<BookEntry>,
}

impl OrderBook {
    /// Entries of one side.
    #[must_use]
    pub fn side(&self, side: BookSide) -> &[BookEntry] {
        match side {
            BookSide::Bid => &self.bid,
            BookSide::Ask => &self.ask,
        }
    }
}

/// An aggregated price bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket price.
    pub price: Decimal,
    /// Total base quantity.
    pub size: Decimal,
}

/// Aggregate bids into price buckets of `step` quote units.
///
/// Entries whose rounded price is zero are dropped. Buckets come back sorted
/// from highest to lowest price.
#[must_use]
pub fn aggregate(entries: &[BookEntry], step: Decimal, price_precision: u32) -> Vec<Bucket> {
    let mut buckets: BTreeMap<Decimal, Decimal> = BTreeMap::new();
    for entry in entries {
        let price = precision::round(precision::round_to_step(entry.rate, step), price_precision);
        if price > Decimal::ZERO {
            *buckets.entry(price).or_default() += entry.quantity;
        }
    }
    buckets
        .into_iter()
        .rev()
        .map(|(price, size)| Bucket { price, size })
        .collect()
}
