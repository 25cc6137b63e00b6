//! Reserve-hold policy.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{MarketPair, precision};
use crate::domain::strategy::Multiplier;

/// Markets in which a reserve of the base asset is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<MarketPair>", into = "Vec<MarketPair>")]
pub struct HoldSet(HashSet<MarketPair>);

impl HoldSet {
    /// True if `pair` is held.
    #[must_use]
    pub fn contains(&self, pair: &MarketPair) -> bool {
        self.0.contains(pair)
    }

    /// Number of held markets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Quantity to sell after a buy of `filled` fills.
    ///
    /// Held markets sell back the cost basis only (`filled / take_profit`,
    /// floored to size precision) and keep the rest.
    #[must_use]
    pub fn sell_size(
        &self,
        pair: &MarketPair,
        filled: Decimal,
        take_profit: Multiplier,
        size_precision: u32,
    ) -> Decimal {
        if self.contains(pair) {
            precision::floor(filled / take_profit.value(), size_precision)
        } else {
            filled
        }
    }
}

impl FromIterator<MarketPair> for HoldSet {
    fn from_iter<I: IntoIterator<Item = MarketPair>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<MarketPair>> for HoldSet {
    fn from(value: Vec<MarketPair>) -> Self {
        value.into_iter().collect()
    }
}

impl From<HoldSet> for Vec<MarketPair> {
    fn from(value: HoldSet) -> Self {
        value.0.into_iter().collect()
    }
}
