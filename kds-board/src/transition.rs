//! Order status transitions
//!
//! Applies a status change through the remote source, with the checklist
//! gate enforced locally first: an in-preparation order whose items are not
//! all checked never reaches the network. After a successful update the
//! poller re-fetches both order sets so the board reflects what the source
//! of record actually stored, not an optimistic local patch.

use std::sync::Arc;

use chrono::Utc;
use kds_common::events::{EventBus, KdsEvent};
use kds_common::orders::{Order, OrderStatus};
use tracing::{info, warn};

use crate::checklist::ChecklistStore;
use crate::error::{Error, Result};
use crate::poller::OrderPoller;
use crate::remote::OrderSource;
use crate::state::BoardState;

/// Performs gated status updates against the remote source
pub struct TransitionService {
    source: Arc<dyn OrderSource>,
    checklist: ChecklistStore,
    board: BoardState,
    poller: Arc<OrderPoller>,
    events: EventBus,
}

impl TransitionService {
    pub fn new(
        source: Arc<dyn OrderSource>,
        checklist: ChecklistStore,
        board: BoardState,
        poller: Arc<OrderPoller>,
        events: EventBus,
    ) -> Self {
        Self {
            source,
            checklist,
            board,
            poller,
            events,
        }
    }

    /// Move an order to a new status.
    ///
    /// `ChecklistIncomplete` is returned without any remote call when an
    /// in-preparation order is sent to completed with unchecked items. A
    /// remote failure mutates nothing locally and is not retried here; the
    /// caller decides whether to try again.
    pub async fn transition(&self, order_id: i64, new_status: OrderStatus) -> Result<Order> {
        let order = self
            .board
            .find_order(order_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("order {}", order_id)))?;

        if order.status == OrderStatus::InPreparation
            && new_status == OrderStatus::Completed
            && !self.checklist.can_complete(&order).await?
        {
            return Err(Error::ChecklistIncomplete { order_id });
        }

        let updated = self.source.update_status(order_id, new_status).await?;

        info!("Order {} moved to {}", order_id, updated.status);
        self.events.emit_lossy(KdsEvent::OrderStatusChanged {
            order_id,
            new_status: updated.status,
            timestamp: Utc::now(),
        });

        // Ground-truth refresh of both sets; a failure here only delays the
        // board, the transition itself already succeeded
        if let Err(e) = self.poller.poll_once().await {
            warn!("Post-transition refresh failed: {}", e);
        }

        Ok(updated)
    }
}
