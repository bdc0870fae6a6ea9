//! Database access for the KDS board
//!
//! SQLite-backed local persistence: settings key/value store, the order
//! snapshot from the previous poll, and the preparation checklist.

pub mod init;
pub mod settings;

pub use init::init_database;
