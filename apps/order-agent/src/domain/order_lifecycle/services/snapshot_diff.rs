//! Snapshot diffing.
//!
//! Pure functions over two consecutive observations. An order that leaves the
//! open list is a cancellation only if the current closed history does not
//! contain it; otherwise it is a fill and the fill detector reports it.

use crate::domain::order_lifecycle::events::LifecycleEvent;
use crate::domain::order_lifecycle::snapshot::OrderSnapshot;

/// Changes in the open-order list between two polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenChanges {
    /// Orders that left the open list and are not in the closed history.
    pub cancelled: Vec<LifecycleEvent>,
    /// Orders newly present in the open list.
    pub opened: Vec<LifecycleEvent>,
}

/// Classify open-list changes.
#[must_use]
pub fn classify_open_changes(
    previous_open: &OrderSnapshot,
    current_open: &OrderSnapshot,
    current_history: &OrderSnapshot,
) -> OpenChanges {
    let cancelled = current_open
        .removed_since(previous_open)
        .into_iter()
        .filter(|order| !current_history.contains(&order.id))
        .map(|order| LifecycleEvent::Cancelled(order.clone()))
        .collect();

    let opened = current_open
        .added_since(previous_open)
        .into_iter()
        .map(|order| LifecycleEvent::Opened(order.clone()))
        .collect();

    OpenChanges { cancelled, opened }
}

/// Orders newly present in the closed history, in history order.
#[must_use]
pub fn detect_fills(previous_history: &OrderSnapshot, current_history: &OrderSnapshot) -> Vec<LifecycleEvent> {
    current_history
        .added_since(previous_history)
        .into_iter()
        .map(|order| LifecycleEvent::Filled(order.clone()))
        .collect()
}
