//! Strategy Bounded Context
//!
//! Settings that drive how fills are followed up.

mod buy_call;
mod hold;
mod kind;
mod multiplier;
mod notify_level;

pub use buy_call::{BuyCall, LadderPlan, plan_ladder};
pub use hold::HoldSet;
pub use kind::StrategyKind;
pub use multiplier::Multiplier;
pub use notify_level::{MessageKind, NotifyLevel};

/// DCA re-buy size relative to the stopped-out quantity.
pub const DCA_FACTOR: rust_decimal::Decimal = rust_decimal_macros::dec!(2.2);

/// Settings re-read at the top of every loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicSettings {
    /// Notification verbosity.
    pub level: NotifyLevel,
    /// Take-profit multiplier.
    pub take_profit: Multiplier,
    /// Stop-loss multiplier.
    pub stop_loss: Multiplier,
}

impl Default for DynamicSettings {
    fn default() -> Self {
        Self {
            level: NotifyLevel::Default,
            take_profit: Multiplier::TAKE_PROFIT,
            stop_loss: Multiplier::STOP_LOSS,
        }
    }
}
