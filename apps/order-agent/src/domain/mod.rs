//! Domain Layer
//!
//! The innermost layer containing trading logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Entities**: Exchange orders and conditional orders, identified by exchange id
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Events**: Lifecycle transitions derived from snapshot diffs
//! - **Domain Services**: Stateless diffing and planning logic
//!
//! # Bounded Contexts
//!
//! - [`order_lifecycle`]: Orders, snapshots and the opened/cancelled/filled diff
//! - [`market`]: Market metadata, tickers, order books
//! - [`rate_limit`]: Endpoint throttle tiers and the persisted session document
//! - [`strategy`]: Strategy kind, multipliers, notification levels, buy ladder

pub mod market;
pub mod order_lifecycle;
pub mod rate_limit;
pub mod shared;
pub mod strategy;
