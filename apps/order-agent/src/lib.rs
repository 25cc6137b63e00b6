// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Order Agent - Rust Core Library
//!
//! Autonomous order-lifecycle agent for a crypto exchange account.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (value objects, snapshot diffs)
//!   - `order_lifecycle`: Orders, conditional orders, snapshots and fill detection
//!   - `market`: Markets, tickers, order books and summaries
//!   - `rate_limit`: Throttle intensities and the persisted session document
//!   - `strategy`: Multipliers, notification levels, hold set and buy ladder
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`ExchangePort`, `SessionStore`, `NotifierPort`)
//!   - `services`: `RequestGovernor`, `OrderComposer`, `Notifier`, `TradingLoop`
//!   - `use_cases`: `ProcessFills`, `DetectOpenOrders`, `SweepStaleOrders`, `MaintainBuyLadder`
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `exchange`: Paper exchange and the governed decorator
//!   - `session`: File and in-memory session persistence
//!   - `settings`: Dynamic settings re-read from the config file

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases, services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

/// YAML configuration.
pub mod config;

/// Logging and metrics.
pub mod observability;

pub use domain::order_lifecycle::{
    ConditionalOrder, Order, OrderSide, OrderSnapshot, OrderType, TimeInForce,
};
pub use domain::shared::{ApiVersion, DomainError, MarketPair, OrderId};
pub use domain::strategy::{DynamicSettings, Multiplier, NotifyLevel, StrategyKind};

pub use application::ports::{ExchangeError, ExchangePort, SettingsPort};
pub use application::services::{Notifier, RequestGovernor, TradingLoop, TradingLoopConfig};
pub use application::use_cases::{
    DetectOpenOrdersUseCase, EngineError, MaintainBuyLadderUseCase, ProcessFillsUseCase,
    StrategyConfig, SweepStaleOrdersUseCase,
};

pub use infrastructure::exchange::{GovernedExchange, PaperExchange};
pub use infrastructure::session::{FileSessionLock, FileSessionStore};
