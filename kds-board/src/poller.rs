//! Order poller
//!
//! Periodically reconciles the remote order set against the persisted
//! snapshot to find newly-arrived orders without re-alerting for ones staff
//! already saw. One cycle: fetch active + completed, diff confirmed ids
//! against the previous snapshot, replace the snapshot atomically, publish
//! board state, signal the notification controller.
//!
//! A failed cycle changes nothing locally; the next scheduled poll retries
//! unconditionally.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kds_common::events::{EventBus, KdsEvent};
use kds_common::orders::{Order, OrderStatus, ACTIVE_STATUSES};
use tokio::time;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::notifier::NotificationController;
use crate::remote::OrderSource;
use crate::snapshot::SnapshotStore;
use crate::state::BoardState;

/// Result of one successful poll cycle
#[derive(Debug)]
pub struct PollOutcome {
    pub active: Vec<Order>,
    pub completed: Vec<Order>,
    /// Orders first seen as confirmed this cycle
    pub newly_arrived: Vec<Order>,
}

/// Orders in the current fetch that are confirmed and were not confirmed in
/// the previous snapshot.
///
/// Id-based set difference restricted to confirmed status: an order that
/// changes status between polls without ever being seen as confirmed is not
/// newly arrived. An empty previous snapshot (first poll of a fresh station)
/// makes every current confirmed order count.
pub fn diff_newly_arrived(
    current: &[Order],
    previous: &HashMap<i64, OrderStatus>,
) -> Vec<Order> {
    current
        .iter()
        .filter(|order| order.status == OrderStatus::Confirmed)
        .filter(|order| previous.get(&order.id) != Some(&OrderStatus::Confirmed))
        .cloned()
        .collect()
}

/// Periodic reconciliation of remote orders against local state
pub struct OrderPoller {
    source: Arc<dyn OrderSource>,
    snapshot: SnapshotStore,
    board: BoardState,
    notifier: Arc<NotificationController>,
    events: EventBus,
    poll_period: Duration,
}

impl OrderPoller {
    pub fn new(
        source: Arc<dyn OrderSource>,
        snapshot: SnapshotStore,
        board: BoardState,
        notifier: Arc<NotificationController>,
        events: EventBus,
        poll_period: Duration,
    ) -> Self {
        Self {
            source,
            snapshot,
            board,
            notifier,
            events,
            poll_period,
        }
    }

    /// Run one poll cycle
    ///
    /// Any fetch or store failure abandons the whole cycle with the snapshot
    /// untouched.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let active = self.source.fetch_orders(&ACTIVE_STATUSES).await?;
        let completed = self
            .source
            .fetch_orders(&[OrderStatus::Completed])
            .await?;

        let previous = self.snapshot.load().await?;
        let newly_arrived = diff_newly_arrived(&active, &previous);

        let projection: Vec<(i64, OrderStatus)> =
            active.iter().map(|o| (o.id, o.status)).collect();
        self.snapshot.replace(&projection).await?;

        self.board
            .set_orders(active.clone(), completed.clone())
            .await;

        let confirmed_count = active
            .iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .count();

        if !newly_arrived.is_empty() {
            info!(
                "{} new order(s): {:?}",
                newly_arrived.len(),
                newly_arrived.iter().map(|o| o.id).collect::<Vec<_>>()
            );
        }

        self.events.emit_lossy(KdsEvent::OrdersRefreshed {
            active_count: active.len(),
            completed_count: completed.len(),
            newly_arrived: newly_arrived.iter().map(|o| o.id).collect(),
            timestamp: Utc::now(),
        });

        self.notifier
            .observe_poll(confirmed_count, !newly_arrived.is_empty())
            .await;

        debug!(
            "Poll done: {} active, {} completed, {} new",
            active.len(),
            completed.len(),
            newly_arrived.len()
        );

        Ok(PollOutcome {
            active,
            completed,
            newly_arrived,
        })
    }

    /// Poll loop: fires immediately on startup, then on the fixed period.
    ///
    /// Cycles run strictly one at a time; a slow cycle delays the next tick
    /// rather than overlapping it. Failures are logged and the loop keeps
    /// going.
    pub async fn run(self: Arc<Self>) {
        let mut tick = time::interval(self.poll_period);
        tick.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        info!(
            "Order poll task started ({}s interval)",
            self.poll_period.as_secs()
        );

        loop {
            tick.tick().await;
            if let Err(e) = self.poll_once().await {
                warn!("Poll cycle failed, retrying next interval: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kds_common::orders::Billing;

    fn order(id: i64, status: OrderStatus) -> Order {
        Order {
            id,
            status,
            date_created: Utc::now(),
            total: String::new(),
            line_items: vec![],
            billing: Billing::default(),
        }
    }

    #[test]
    fn diff_finds_unseen_confirmed_orders() {
        let previous = HashMap::from([(1, OrderStatus::Confirmed)]);
        let current = vec![order(1, OrderStatus::Confirmed), order(2, OrderStatus::Confirmed)];

        let newly = diff_newly_arrived(&current, &previous);
        assert_eq!(newly.len(), 1);
        assert_eq!(newly[0].id, 2);
    }

    #[test]
    fn diff_ignores_orders_not_confirmed_now() {
        let previous = HashMap::new();
        let current = vec![order(1, OrderStatus::InPreparation)];
        assert!(diff_newly_arrived(&current, &previous).is_empty());
    }

    #[test]
    fn diff_counts_order_previously_seen_in_other_status() {
        // Seen in preparation last cycle, confirmed now: first confirmed
        // sighting, so it counts
        let previous = HashMap::from([(1, OrderStatus::InPreparation)]);
        let current = vec![order(1, OrderStatus::Confirmed)];
        assert_eq!(diff_newly_arrived(&current, &previous).len(), 1);
    }

    #[test]
    fn empty_history_counts_everything_confirmed() {
        let previous = HashMap::new();
        let current = vec![order(1, OrderStatus::Confirmed), order(2, OrderStatus::Confirmed)];
        assert_eq!(diff_newly_arrived(&current, &previous).len(), 2);
    }

    #[test]
    fn identical_polls_are_idempotent() {
        let current = vec![order(1, OrderStatus::Confirmed)];
        let after_first: HashMap<i64, OrderStatus> =
            current.iter().map(|o| (o.id, o.status)).collect();
        assert!(diff_newly_arrived(&current, &after_first).is_empty());
    }
}
