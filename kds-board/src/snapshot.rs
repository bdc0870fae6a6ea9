//! Snapshot store
//!
//! Persists the (order id, status) projection of the active order set as of
//! the last successful poll. The poller diffs each fresh fetch against this
//! set to find newly-arrived orders; it survives process restarts so a
//! restart does not re-alert for orders staff already saw.

use kds_common::orders::OrderStatus;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::error::Result;

/// SQLite-backed snapshot of the previous poll's active orders
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    db: SqlitePool,
}

impl SnapshotStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Load the full snapshot set, keyed by order id
    pub async fn load(&self) -> Result<HashMap<i64, OrderStatus>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT order_id, status FROM order_snapshot")
                .fetch_all(&self.db)
                .await?;

        let mut snapshot = HashMap::with_capacity(rows.len());
        for (order_id, status) in rows {
            // Rows written by a different (newer) build with an unknown tag
            // are skipped rather than poisoning every poll
            match status.parse::<OrderStatus>() {
                Ok(parsed) => {
                    snapshot.insert(order_id, parsed);
                }
                Err(_) => {
                    tracing::warn!("Dropping snapshot row with unknown status: {}", status);
                }
            }
        }
        Ok(snapshot)
    }

    /// Atomically replace the snapshot set with a fresh projection
    ///
    /// Runs inside one transaction: concurrent readers observe either the
    /// previous complete set or the new complete set, never a partial mix.
    pub async fn replace(&self, entries: &[(i64, OrderStatus)]) -> Result<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM order_snapshot")
            .execute(&mut *tx)
            .await?;

        for (order_id, status) in entries {
            sqlx::query("INSERT INTO order_snapshot (order_id, status) VALUES (?, ?)")
                .bind(order_id)
                .bind(status.to_string())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
