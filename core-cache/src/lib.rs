//! # Snapshot Cache Module
//!
//! Owns the durable, bounded cache of list snapshots that backs offline
//! fallback.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling (WAL mode, health checks)
//! - The [`SnapshotStore`](store::SnapshotStore) repository: one bounded
//!   snapshot per resource key, replaced wholesale by each successful
//!   page-1 fetch
//! - An in-memory LRU read-through layer in front of the database
//!
//! The store is constructed explicitly and passed into the engine; there is
//! no hidden global database handle.

pub mod db;
pub mod error;
pub mod store;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{CacheError, Result};
pub use store::{SnapshotStore, SqliteSnapshotStore};
