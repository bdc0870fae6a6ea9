//! Preparation checklist store and completion gate
//!
//! Staff check off each line item while preparing an order. The gate blocks
//! the in-preparation → completed transition until every item is checked.
//! Flags default to unchecked, so the gate fails closed for orders nobody
//! has touched.
//!
//! Entries outlive their orders and are never deleted.

use kds_common::orders::{Order, OrderStatus};
use sqlx::SqlitePool;
use std::collections::HashSet;

use crate::error::Result;

/// Decide completion readiness from an order and its checked keys.
///
/// True iff every line item's checklist key appears in `checked`. Keys in
/// `checked` that match no current line item (stale toggles, re-edited
/// orders) are ignored.
pub fn all_items_checked(order: &Order, checked: &HashSet<String>) -> bool {
    order.checklist_keys().all(|key| checked.contains(&key))
}

/// SQLite-backed per-order, per-item preparation flags
#[derive(Debug, Clone)]
pub struct ChecklistStore {
    db: SqlitePool,
}

impl ChecklistStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Whether one item is checked; unseen keys read as false
    pub async fn is_checked(&self, order_id: i64, key: &str) -> Result<bool> {
        let checked: Option<i64> = sqlx::query_scalar(
            "SELECT checked FROM checklist WHERE order_id = ? AND item_key = ?",
        )
        .bind(order_id)
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(checked.unwrap_or(0) != 0)
    }

    /// Flip one item's flag; a missing entry is created checked.
    ///
    /// Returns the new value. The key is not validated against the order's
    /// current line items — stale keys are tolerated.
    pub async fn toggle(&self, order_id: i64, key: &str) -> Result<bool> {
        let new_value = !self.is_checked(order_id, key).await?;

        sqlx::query(
            r#"
            INSERT INTO checklist (order_id, item_key, checked)
            VALUES (?, ?, ?)
            ON CONFLICT(order_id, item_key) DO UPDATE SET checked = excluded.checked
            "#,
        )
        .bind(order_id)
        .bind(key)
        .bind(new_value as i64)
        .execute(&self.db)
        .await?;

        Ok(new_value)
    }

    /// All currently-checked keys for one order
    pub async fn checked_keys(&self, order_id: i64) -> Result<HashSet<String>> {
        let keys: Vec<String> = sqlx::query_scalar(
            "SELECT item_key FROM checklist WHERE order_id = ? AND checked = 1",
        )
        .bind(order_id)
        .fetch_all(&self.db)
        .await?;

        Ok(keys.into_iter().collect())
    }

    /// Whether this order may move to `completed`.
    ///
    /// Orders outside `in_preparation` are not gated. No side effects; safe
    /// to call on every poll or render.
    pub async fn can_complete(&self, order: &Order) -> Result<bool> {
        if order.status != OrderStatus::InPreparation {
            return Ok(true);
        }
        let checked = self.checked_keys(order.id).await?;
        Ok(all_items_checked(order, &checked))
    }
}
