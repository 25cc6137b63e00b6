//! Decimal precision helpers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round half away from zero to `dp` decimal places.
#[must_use]
pub fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncate toward zero to `dp` decimal places.
#[must_use]
pub fn floor(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::ToZero)
}

/// Round `value` to the nearest multiple of `step`. A non-positive step is a no-op.
#[must_use]
pub fn round_to_step(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * step
}
