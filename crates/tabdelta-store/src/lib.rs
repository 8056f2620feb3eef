//! tabdelta Store - SQLite persistence for versioned table snapshots
//!
//! Provides:
//! - Connection configuration and embedded migrations
//! - Schema registry mapping logical columns to physical row tables
//! - Identity index and shared row store with batched access
//! - Version log of delta descriptors
//! - Physical-table reclamation

pub mod catalog;
pub mod codec;
pub mod config;
pub mod db;
pub mod errors;
pub mod identity;
pub mod migrations;
pub mod reclaim;
pub mod rows;
pub mod version_log;

// Re-export key types
pub use catalog::{RegisteredColumn, TableHandle};
pub use config::{JournalMode, ReclaimOptions, StoreConfig, SyncMode};
pub use errors::Result;
pub use reclaim::ReclaimReport;
