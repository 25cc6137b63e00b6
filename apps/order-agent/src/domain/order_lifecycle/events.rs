//! Lifecycle events derived from snapshot diffs.

use crate::domain::order_lifecycle::aggregate::Order;

/// What happened to an order between two polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Appeared in the open list.
    Opened(Order),
    /// Left the open list without showing up in the closed history.
    Cancelled(Order),
    /// Newly present in the closed history.
    Filled(Order),
}

impl LifecycleEvent {
    /// The order the event refers to.
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Opened(o) | Self::Cancelled(o) | Self::Filled(o) => o,
        }
    }

    /// Short lowercase label, used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Opened(_) => "opened",
            Self::Cancelled(_) => "cancelled",
            Self::Filled(_) => "filled",
        }
    }
}
