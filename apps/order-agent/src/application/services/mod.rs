//! Application Services
//!
//! Services shared by the use cases (governor, market cache, order composer,
//! notifier, market data) and the long-running trading loop that drives them.

mod market_cache;
mod market_data;
pub(crate) mod notifier;
mod order_composer;
mod request_governor;
mod trading_loop;

pub use market_cache::MarketCache;
pub use market_data::{BOOK_DEPTH, MarketDataError, MarketDataService};
pub use notifier::{Notifier, error_chain};
pub use order_composer::{OcoPlacement, OrderComposer};
pub use request_governor::{GovernorError, Permit, RequestGovernor};
pub use trading_loop::{DEFAULT_SWEEP_INTERVAL_SECS, Iteration, TradingLoop, TradingLoopConfig};
