//! Order Lifecycle Value Objects
//!
//! Immutable types for order management.

mod new_order;
mod order_side;
mod order_type;
mod time_in_force;

pub use new_order::{NewConditionalOrder, NewOrder, OrderToCancel, TriggerOperand};
pub use order_side::{Direction, OrderSide};
pub use order_type::OrderType;
pub use time_in_force::TimeInForce;
