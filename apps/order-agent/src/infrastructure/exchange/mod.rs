//! Exchange adapters.
//!
//! The live transport is supplied by the embedding application; this module
//! carries the governor decorator and the paper exchange.

mod governed;
mod paper;

pub use governed::GovernedExchange;
pub use paper::PaperExchange;
