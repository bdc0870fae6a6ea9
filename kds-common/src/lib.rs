//! # KDS Common Library
//!
//! Shared code for the KDS counter order board:
//! - Order record types (closed status enumeration, line items, checklist keys)
//! - Event types (KdsEvent enum) and the broadcast EventBus
//! - Configuration loading
//! - Database initialization and the settings key/value store

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod orders;

pub use error::{Error, Result};
pub use orders::{LineItem, Order, OrderStatus};
