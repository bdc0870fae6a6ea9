//! Shared board state
//!
//! The latest successful poll's order lists, published for API handlers and
//! the notification controller. Replaced wholesale each cycle; readers get
//! cheap cloned snapshots and never observe a half-updated board.

use chrono::{DateTime, Utc};
use kds_common::orders::{Order, OrderStatus};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the latest poll result
#[derive(Debug, Clone)]
pub struct BoardState {
    inner: Arc<RwLock<BoardStateInner>>,
}

#[derive(Debug, Default)]
struct BoardStateInner {
    active: Vec<Order>,
    completed: Vec<Order>,
    last_poll: Option<DateTime<Utc>>,
}

impl BoardState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BoardStateInner::default())),
        }
    }

    /// Replace both lists with a fresh poll result
    pub async fn set_orders(&self, active: Vec<Order>, completed: Vec<Order>) {
        let mut inner = self.inner.write().await;
        inner.active = active;
        inner.completed = completed;
        inner.last_poll = Some(Utc::now());
    }

    pub async fn active_orders(&self) -> Vec<Order> {
        self.inner.read().await.active.clone()
    }

    pub async fn completed_orders(&self) -> Vec<Order> {
        self.inner.read().await.completed.clone()
    }

    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_poll
    }

    /// Number of orders currently in `confirmed` status
    pub async fn confirmed_count(&self) -> usize {
        self.inner
            .read()
            .await
            .active
            .iter()
            .filter(|o| o.status == OrderStatus::Confirmed)
            .count()
    }

    /// Look up one order by id across the active and completed lists
    pub async fn find_order(&self, order_id: i64) -> Option<Order> {
        let inner = self.inner.read().await;
        inner
            .active
            .iter()
            .chain(inner.completed.iter())
            .find(|o| o.id == order_id)
            .cloned()
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
