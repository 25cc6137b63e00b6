//! Order Lifecycle Bounded Context
//!
//! Exchange orders, conditional orders, and the snapshot diffing that turns
//! consecutive polls into lifecycle events.

pub mod aggregate;
pub mod events;
pub mod services;
pub mod snapshot;
pub mod value_objects;

pub use aggregate::{ConditionalOrder, Order};
pub use events::LifecycleEvent;
pub use snapshot::{OrderSnapshot, SnapshotStore};
pub use value_objects::{
    Direction, NewConditionalOrder, NewOrder, OrderSide, OrderToCancel, OrderType, TimeInForce,
    TriggerOperand,
};
