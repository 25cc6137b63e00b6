//! Market Bounded Context
//!
//! Market metadata, tickers, 24h statistics and order books.

mod market;
mod order_book;
mod summary;

pub use market::{
    DEFAULT_PRICE_PRECISION, Market, MarketSummary, SIZE_PRECISION, STATUS_ONLINE, Ticker,
};
pub use order_book::{BookEntry, BookSide, Bucket, OrderBook, aggregate};
pub use summary::OrderSummary;

#[cfg(test)]
pub(crate) use market::fixtures;
