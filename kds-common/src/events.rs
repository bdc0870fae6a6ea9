//! Event types for the KDS event system
//!
//! Provides the shared event definitions and the EventBus connecting the
//! poller and notification controller to SSE consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::orders::OrderStatus;

/// Board event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for SSE
/// transmission to connected dashboard clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KdsEvent {
    /// A poll cycle completed and the board state was replaced
    OrdersRefreshed {
        /// Number of active (confirmed / in-preparation) orders
        active_count: usize,
        /// Number of completed orders in the current fetch
        completed_count: usize,
        /// Ids of orders first seen as confirmed this cycle
        newly_arrived: Vec<i64>,
        /// When the poll completed
        timestamp: DateTime<Utc>,
    },

    /// The alert sound should play now
    ///
    /// Consumed by connected dashboard clients; the service itself has no
    /// audio device.
    AlertRing {
        /// Seconds until the next automatic ring
        next_ring_s: u32,
        timestamp: DateTime<Utc>,
    },

    /// Notification controller state changed (mute toggle, loop start/stop)
    NotificationChanged {
        muted: bool,
        looping: bool,
        countdown_s: u32,
        timestamp: DateTime<Utc>,
    },

    /// An order's status was updated through the board
    OrderStatusChanged {
        order_id: i64,
        new_status: OrderStatus,
        timestamp: DateTime<Utc>,
    },
}

impl KdsEvent {
    /// Event name used as the SSE event type
    pub fn event_name(&self) -> &'static str {
        match self {
            KdsEvent::OrdersRefreshed { .. } => "orders_refreshed",
            KdsEvent::AlertRing { .. } => "alert_ring",
            KdsEvent::NotificationChanged { .. } => "notification_changed",
            KdsEvent::OrderStatusChanged { .. } => "order_status_changed",
        }
    }
}

/// Broadcast bus distributing [`KdsEvent`]s to all subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<KdsEvent>,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<KdsEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` when at least one subscriber exists,
    /// `Err` when nobody is listening.
    pub fn emit(&self, event: KdsEvent) -> Result<usize, broadcast::error::SendError<KdsEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the result when no subscriber is connected
    pub fn emit_lossy(&self, event: KdsEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of currently connected subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        bus.emit_lossy(KdsEvent::AlertRing {
            next_ring_s: 15,
            timestamp: Utc::now(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_name(), "alert_ring");
    }

    #[tokio::test]
    async fn emit_without_subscriber_reports_error() {
        let bus = EventBus::new(16);
        let result = bus.emit(KdsEvent::AlertRing {
            next_ring_s: 15,
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
    }
}
