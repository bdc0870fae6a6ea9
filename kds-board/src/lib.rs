//! # KDS Board Service
//!
//! Counter-side order dashboard service. Polls the remote order source on a
//! fixed period, tracks which orders are newly arrived across cycles, drives
//! the audible alert loop while confirmed orders are outstanding, and gates
//! the in-preparation → completed transition on the per-item checklist.

pub mod api;
pub mod checklist;
pub mod error;
pub mod notifier;
pub mod poller;
pub mod remote;
pub mod snapshot;
pub mod state;
pub mod transition;

pub use error::{Error, Result};
