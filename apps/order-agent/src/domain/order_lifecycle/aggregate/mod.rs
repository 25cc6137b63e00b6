//! Order Lifecycle Entities

mod conditional_order;
mod order;

pub use conditional_order::ConditionalOrder;
pub use order::{Order, TIME_FORMAT, format_exchange_time, parse_exchange_time};

#[cfg(test)]
pub(crate) use order::fixtures;
