//! Order records as consumed from the remote order source
//!
//! The remote source owns these records; the board holds transient read-only
//! copies per poll cycle. Status tags form a closed set — anything else is
//! rejected at the deserialization boundary instead of being carried along
//! as an opaque string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order workflow status
///
/// Wire tags: `confirmed`, `in_preparation`, `completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Confirmed,
    InPreparation,
    Completed,
}

/// Statuses considered "active" on the board (confirmed or in preparation)
pub const ACTIVE_STATUSES: [OrderStatus; 2] = [OrderStatus::Confirmed, OrderStatus::InPreparation];

impl OrderStatus {
    /// Whether the order still needs counter attention
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::InPreparation)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::InPreparation => write!(f, "in_preparation"),
            OrderStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(OrderStatus::Confirmed),
            "in_preparation" => Ok(OrderStatus::InPreparation),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown order status: {}",
                other
            ))),
        }
    }
}

/// One line of an order: a dish name and how many of it
///
/// Monetary fields are decimal strings computed by the remote source and
/// passed through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub total_tax: String,
}

impl LineItem {
    /// Key identifying this quantity/name pairing within its order.
    ///
    /// Two line items with identical name and quantity in the same order
    /// collapse to one key; the preparation checklist then tracks them as a
    /// single entry.
    pub fn checklist_key(&self) -> String {
        format!("{}×{}", self.quantity, self.name)
    }
}

/// Customer contact details attached to an order (displayed, never parsed)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Billing {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Billing {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A full order record from the remote source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Stable identifier assigned by the remote source
    pub id: i64,
    pub status: OrderStatus,
    pub date_created: DateTime<Utc>,
    /// Order total as a decimal string, tax included
    #[serde(default)]
    pub total: String,
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub billing: Billing,
}

impl Order {
    /// Checklist keys for every line item of this order
    pub fn checklist_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.line_items.iter().map(|item| item.checklist_key())
    }
}
