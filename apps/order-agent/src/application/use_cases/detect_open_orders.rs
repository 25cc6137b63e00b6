//! Detect Open Orders Use Case
//!
//! Diffs the open-order list against the previous poll. Must run after the
//! fill pass so the closed history it consults is current; an order that is
//! in the history is a fill and never reported as cancelled.

use std::sync::Arc;

use tracing::info;

use super::{Context, EngineError, order_json};
use crate::application::ports::{ExchangePort, Notification, OrderScope};
use crate::application::services::Notifier;
use crate::domain::order_lifecycle::services::classify_open_changes;
use crate::domain::order_lifecycle::{Order, OrderSide, OrderSnapshot};
use crate::domain::strategy::{MessageKind, NotifyLevel};
use crate::observability::{record_order_cancelled, record_order_opened};

/// Outcome of one open-order pass.
#[derive(Debug, Clone, Default)]
pub struct OpenPass {
    /// Freshly polled open orders; replaces the stored snapshot.
    pub snapshot: OrderSnapshot,
    /// Orders classified as cancelled.
    pub cancelled: Vec<Order>,
    /// Orders classified as newly opened.
    pub opened: Vec<Order>,
}

/// Use case for detecting opened and cancelled orders.
pub struct DetectOpenOrdersUseCase<E: ExchangePort> {
    exchange: Arc<E>,
    notifier: Arc<Notifier>,
}

impl<E: ExchangePort> DetectOpenOrdersUseCase<E> {
    /// Create a new `DetectOpenOrdersUseCase`.
    pub const fn new(exchange: Arc<E>, notifier: Arc<Notifier>) -> Self {
        Self { exchange, notifier }
    }

    /// Poll open orders and classify changes since `previous`.
    ///
    /// # Errors
    ///
    /// Returns an error if the open orders cannot be fetched; the caller
    /// keeps its previous snapshot.
    pub async fn execute(
        &self,
        previous: &OrderSnapshot,
        history: &OrderSnapshot,
        level: NotifyLevel,
    ) -> Result<OpenPass, EngineError> {
        let snapshot: OrderSnapshot = self
            .exchange
            .open_orders(&OrderScope::All)
            .await
            .context("fetch open orders")?
            .into();

        let changes = classify_open_changes(previous, &snapshot, history);

        let mut cancelled = Vec::with_capacity(changes.cancelled.len());
        for event in changes.cancelled {
            let order = event.order();
            info!(order_id = %order.id, order = %order_json(order), "[CANCELLED]");
            record_order_cancelled();
            if let Some(side) = order.side() {
                let title = self.notifier.title(&format!("Done {side} (Reason: Cancelled)"));
                self.notifier
                    .notify(level, Notification::new(MessageKind::Cancelled, title, order_json(order)))
                    .await;
            }
            cancelled.push(order.clone());
        }

        let mut opened = Vec::with_capacity(changes.opened.len());
        for event in changes.opened {
            let order = event.order();
            info!(order_id = %order.id, order = %order_json(order), "[OPEN]");
            record_order_opened();
            if let Some(side) = order.side() {
                self.notify_opened(order, side, history, level).await;
            }
            opened.push(order.clone());
        }

        Ok(OpenPass {
            snapshot,
            cancelled,
            opened,
        })
    }

    async fn notify_opened(&self, order: &Order, side: OrderSide, history: &OrderSnapshot, level: NotifyLevel) {
        // The exchange occasionally re-announces sells that already filled.
        let reannounced = side == OrderSide::Sell && history.contains_with_side(&order.id, OrderSide::Sell);
        if reannounced && level != NotifyLevel::Verbose {
            return;
        }
        let wanted = level.can_send(MessageKind::Opened) || (level == NotifyLevel::Default && side == OrderSide::Sell);
        if wanted {
            let title = self.notifier.title(&format!("Open {side}"));
            self.notifier
                .deliver(Notification::new(MessageKind::Opened, title, order_json(order)))
                .await;
        }
    }
}
