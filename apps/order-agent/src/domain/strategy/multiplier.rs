//! Price multipliers.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, precision};

/// Factor applied to a fill price, e.g. `1.05` for a 5% take-profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Multiplier(Decimal);

impl Multiplier {
    /// Default take-profit.
    pub const TAKE_PROFIT: Self = Self(dec!(1.05));
    /// Default stop-loss.
    pub const STOP_LOSS: Self = Self(dec!(0.95));

    /// Validate a positive factor.
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidValue {
                field: "multiplier".to_string(),
                message: format!("must be positive, got {value}"),
            });
        }
        Ok(Self(value))
    }

    /// The raw factor.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// `price × factor` rounded to `price_precision`.
    #[must_use]
    pub fn apply(self, price: Decimal, price_precision: u32) -> Decimal {
        precision::round(price * self.0, price_precision)
    }

    /// Percentage form used in notification titles, e.g. `+5.00%`.
    #[must_use]
    pub fn format(self) -> String {
        let percent = ((self.0 - Decimal::ONE) * dec!(100)).round_dp(2);
        if percent.is_sign_negative() {
            format!("{percent:.2}%")
        } else {
            format!("+{percent:.2}%")
        }
    }
}

impl TryFrom<Decimal> for Multiplier {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Multiplier> for Decimal {
    fn from(value: Multiplier) -> Self {
        value.0
    }
}

impl fmt::Display for Multiplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
