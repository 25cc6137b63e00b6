//! Application Layer
//!
//! The application layer orchestrates domain logic through use cases.
//! It defines:
//!
//! - **Ports**: Interfaces for the exchange, session storage, notifications,
//!   settings and time
//! - **Services**: Request governor, order composer, notifier and the
//!   trading loop
//! - **Use Cases**: Fill processing, open-order detection, stale-order
//!   sweeping and buy-ladder maintenance

pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::*;
pub use services::*;
pub use use_cases::*;
