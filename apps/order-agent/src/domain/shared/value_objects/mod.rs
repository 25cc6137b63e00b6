//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.

mod identifiers;
pub mod precision;
mod symbol;

pub use identifiers::{ConditionalOrderId, OrderId};
pub use symbol::{ApiVersion, MarketPair, is_leveraged_token};
