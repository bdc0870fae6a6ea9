//! Test helpers for kds-board integration tests
//!
//! Provides an in-memory remote order source with call counters, a counting
//! alert sink, and a TestBoard harness wiring the engine against an
//! in-memory database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use kds_board::checklist::ChecklistStore;
use kds_board::error::{Error, Result};
use kds_board::notifier::{AlertSink, NotificationController, RingRejected};
use kds_board::poller::OrderPoller;
use kds_board::remote::OrderSource;
use kds_board::snapshot::SnapshotStore;
use kds_board::state::BoardState;
use kds_board::transition::TransitionService;
use kds_common::db::init::init_memory_database;
use kds_common::db::settings;
use kds_common::events::EventBus;
use kds_common::orders::{Billing, LineItem, Order, OrderStatus};

pub const TEST_REPEAT: Duration = Duration::from_secs(15);

/// Build an order record for tests
pub fn order(id: i64, status: OrderStatus, items: &[(&str, u32)]) -> Order {
    Order {
        id,
        status,
        date_created: Utc::now(),
        total: "10.00".to_string(),
        line_items: items
            .iter()
            .map(|(name, quantity)| LineItem {
                name: name.to_string(),
                quantity: *quantity,
                total: "10.00".to_string(),
                total_tax: "1.00".to_string(),
            })
            .collect(),
        billing: Billing {
            first_name: "Test".to_string(),
            last_name: "Customer".to_string(),
            email: String::new(),
            phone: String::new(),
        },
    }
}

/// In-memory stand-in for the remote order API
pub struct MockOrderSource {
    orders: Mutex<Vec<Order>>,
    pub fetch_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_updates: AtomicBool,
}

impl MockOrderSource {
    pub fn new() -> Self {
        Self {
            orders: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            fail_fetches: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Replace the full remote order set
    pub async fn set_orders(&self, orders: Vec<Order>) {
        *self.orders.lock().await = orders;
    }

    pub async fn push_order(&self, order: Order) {
        self.orders.lock().await.push(order);
    }

    pub fn fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::SeqCst);
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OrderSource for MockOrderSource {
    async fn fetch_orders(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Error::Transport("connection refused".to_string()));
        }
        let orders = self.orders.lock().await;
        Ok(orders
            .iter()
            .filter(|o| statuses.contains(&o.status))
            .cloned()
            .collect())
    }

    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(Error::Remote {
                status: 500,
                body: "remote says no".to_string(),
            });
        }
        let mut orders = self.orders.lock().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| Error::Remote {
                status: 404,
                body: format!("no order {}", order_id),
            })?;
        order.status = status;
        Ok(order.clone())
    }
}

/// Alert sink that counts rings and can simulate a client unable to play
pub struct CountingSink {
    pub rings: AtomicUsize,
    reject: AtomicBool,
}

impl CountingSink {
    pub fn new() -> Self {
        Self {
            rings: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
        }
    }

    pub fn reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn ring_count(&self) -> usize {
        self.rings.load(Ordering::SeqCst)
    }
}

impl AlertSink for CountingSink {
    fn ring(&self, _next_ring_s: u32) -> std::result::Result<(), RingRejected> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(RingRejected);
        }
        self.rings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fully wired board engine over in-memory stores
pub struct TestBoard {
    pub db: SqlitePool,
    pub source: Arc<MockOrderSource>,
    pub sink: Arc<CountingSink>,
    pub events: EventBus,
    pub board: BoardState,
    pub snapshot: SnapshotStore,
    pub checklist: ChecklistStore,
    pub notifier: Arc<NotificationController>,
    pub poller: Arc<OrderPoller>,
    pub transition: TransitionService,
}

impl TestBoard {
    /// Harness with sound enabled (the interesting case for alerting)
    pub async fn new() -> Self {
        Self::with_sound(true).await
    }

    pub async fn with_sound(enabled: bool) -> Self {
        let db = init_memory_database().await.unwrap();
        settings::set_sound_enabled(&db, enabled).await.unwrap();

        let events = EventBus::new(100);
        let source = Arc::new(MockOrderSource::new());
        let sink = Arc::new(CountingSink::new());
        let notifier = Arc::new(
            NotificationController::new(db.clone(), events.clone(), sink.clone(), TEST_REPEAT)
                .await
                .unwrap(),
        );
        let board = BoardState::new();
        let snapshot = SnapshotStore::new(db.clone());
        let checklist = ChecklistStore::new(db.clone());

        let poller = Arc::new(OrderPoller::new(
            source.clone(),
            snapshot.clone(),
            board.clone(),
            notifier.clone(),
            events.clone(),
            Duration::from_secs(10),
        ));

        let transition = TransitionService::new(
            source.clone(),
            checklist.clone(),
            board.clone(),
            poller.clone(),
            events.clone(),
        );

        Self {
            db,
            source,
            sink,
            events,
            board,
            snapshot,
            checklist,
            notifier,
            poller,
            transition,
        }
    }
}
