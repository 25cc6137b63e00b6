//! Order Lifecycle Domain Services

mod snapshot_diff;

pub use snapshot_diff::{OpenChanges, classify_open_changes, detect_fills};
