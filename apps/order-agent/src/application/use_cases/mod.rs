//! Application Use Cases
//!
//! Use cases orchestrate domain logic to fulfill application requirements.
//! Each one runs a single step of the agent loop against the exchange port.

mod detect_open_orders;
mod engine_error;
mod maintain_buy_ladder;
mod process_fills;
mod sweep_stale_orders;

pub use detect_open_orders::{DetectOpenOrdersUseCase, OpenPass};
pub use engine_error::{Context, EngineError};
pub use maintain_buy_ladder::{LadderReport, LadderRequest, MaintainBuyLadderUseCase};
pub use process_fills::{
    DEFAULT_MAX_SELF_TRADE_RETRIES, FillPass, FillReaction, ProcessFillsUseCase, StrategyConfig,
};
pub use sweep_stale_orders::{DEFAULT_MAX_ORDER_AGE_DAYS, SweepReport, SweepStaleOrdersUseCase};

use crate::domain::order_lifecycle::Order;

/// Compact JSON of an order for logs and notification bodies.
pub(crate) fn order_json(order: &Order) -> String {
    serde_json::to_string(order).unwrap_or_else(|_| format!("{{\"id\":\"{}\"}}", order.id))
}
