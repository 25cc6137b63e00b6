//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `exchange/`: the paper exchange and the governed decorator that routes
//!   every call through the request governor
//! - `session/`: file-backed and in-memory session store and lock
//! - `clock`: wall clock and a manual clock for tests
//! - `notify`: log-backed notification and social channels
//! - `settings`: dynamic settings re-read from the config file

pub mod clock;
pub mod exchange;
pub mod notify;
pub mod session;
pub mod settings;
