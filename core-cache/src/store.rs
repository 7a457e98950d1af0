//! Persisted snapshot store for list resources
//!
//! Stores the most recent successful page-1 fetch per resource key, bounded
//! to a fixed number of items, in SQLite. A small in-memory LRU sits in
//! front of the database so repeated reads of the same key skip disk I/O.

use crate::error::{CacheError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lru::LruCache;
use serde_json::Value;
use sqlx::{Pool, Row, Sqlite};
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::{debug, error, instrument};

/// Keys kept in the in-memory read-through layer.
const FRONT_CACHE_CAPACITY: usize = 32;

/// Repository trait for persisted list snapshots.
///
/// A snapshot is the unit of offline fallback: the last successfully
/// fetched first page for a resource key. Writes fully replace the prior
/// entry for the key; there is no merging.
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Initialize the store (create tables if needed).
    async fn initialize(&self) -> Result<()>;

    /// Return the stored items for `key`, or an empty vec if none exist.
    async fn get(&self, key: &str) -> Result<Vec<Value>>;

    /// Replace the stored items for `key` with the first `max_items` of
    /// `items`.
    async fn put(&self, key: &str, items: &[Value]) -> Result<()>;

    /// Age of the stored snapshot for `key`, or `None` if absent.
    async fn snapshot_age(&self, key: &str) -> Result<Option<ChronoDuration>>;

    /// Remove all snapshots (app data reset / logout).
    async fn clear(&self) -> Result<()>;
}

/// SQLite implementation of [`SnapshotStore`].
pub struct SqliteSnapshotStore {
    pool: Pool<Sqlite>,
    max_items: usize,
    front: Mutex<LruCache<String, Vec<Value>>>,
}

impl SqliteSnapshotStore {
    /// Create a new store over the given pool, capping each snapshot at
    /// `max_items` items.
    pub fn new(pool: Pool<Sqlite>, max_items: usize) -> Self {
        let capacity = NonZeroUsize::new(FRONT_CACHE_CAPACITY).expect("non-zero capacity");
        Self {
            pool,
            max_items: max_items.max(1),
            front: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// The per-snapshot item cap.
    pub fn max_items(&self) -> usize {
        self.max_items
    }

    fn front_get(&self, key: &str) -> Option<Vec<Value>> {
        // Poisoned lock means a panicked reader; the front layer is
        // advisory, fall through to the database.
        self.front.lock().ok()?.get(key).cloned()
    }

    fn front_put(&self, key: &str, items: &[Value]) {
        if let Ok(mut front) = self.front.lock() {
            front.put(key.to_string(), items.to_vec());
        }
    }

    fn front_clear(&self) {
        if let Ok(mut front) = self.front.lock() {
            front.clear();
        }
    }
}

#[async_trait::async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    #[instrument(skip(self))]
    async fn initialize(&self) -> Result<()> {
        debug!("Initializing snapshot store");

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS list_snapshots (
                key TEXT PRIMARY KEY NOT NULL,
                items TEXT NOT NULL,
                stored_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to create list_snapshots table: {}", e);
            CacheError::Database(e)
        })?;

        debug!("Snapshot store initialized");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Vec<Value>> {
        if let Some(items) = self.front_get(key) {
            debug!(key, count = items.len(), "Snapshot served from front cache");
            return Ok(items);
        }

        let row = sqlx::query("SELECT items FROM list_snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(Vec::new());
        };

        let raw: String = row.try_get("items")?;
        let items: Vec<Value> = serde_json::from_str(&raw)?;

        self.front_put(key, &items);
        debug!(key, count = items.len(), "Snapshot loaded from database");
        Ok(items)
    }

    #[instrument(skip(self, items))]
    async fn put(&self, key: &str, items: &[Value]) -> Result<()> {
        let capped = &items[..items.len().min(self.max_items)];
        let raw = serde_json::to_string(capped)?;
        let stored_at = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO list_snapshots (key, items, stored_at)
             VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET
                 items = excluded.items,
                 stored_at = excluded.stored_at",
        )
        .bind(key)
        .bind(&raw)
        .bind(&stored_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to write snapshot: {}", e);
            CacheError::Database(e)
        })?;

        self.front_put(key, capped);
        debug!(key, count = capped.len(), "Snapshot replaced");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn snapshot_age(&self, key: &str) -> Result<Option<ChronoDuration>> {
        let row = sqlx::query("SELECT stored_at FROM list_snapshots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw: String = row.try_get("stored_at")?;
        let stored_at: DateTime<Utc> = raw
            .parse()
            .map_err(|e| CacheError::InvalidRow(format!("Bad stored_at timestamp: {}", e)))?;

        Ok(Some(Utc::now() - stored_at))
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM list_snapshots")
            .execute(&self.pool)
            .await?;

        self.front_clear();
        debug!("All snapshots cleared");
        Ok(())
    }
}
