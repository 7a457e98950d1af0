//! # Fetch Coordinator
//!
//! Orchestrates paginated remote fetches for list resources.
//!
//! ## Overview
//!
//! The `FetchCoordinator` owns one [`FetchState`] slot per live
//! [`ResourceKey`] and guarantees:
//!
//! - At most one in-flight fetch per key. A duplicate request while a fetch
//!   is running returns [`ListError::Busy`] immediately with no state
//!   change; it is dropped, not queued.
//! - Offline requests are served from the persisted snapshot (degraded
//!   mode) when one exists, and fail with
//!   [`ListError::OfflineNoCache`] otherwise, without invoking the fetch.
//! - Successful page-1 fetches replace the persisted snapshot; page > 1
//!   fetches never touch it.
//! - Page-1 network failures fall back to the snapshot; page > 1 failures
//!   are non-destructive so previously loaded pages stay visible.
//! - Every remote fetch is bounded by a timeout, so a hung request cannot
//!   leave a key permanently busy.
//!
//! The in-flight flag is released on every exit path, including when the
//! caller drops the load future mid-await.
//!
//! ## Workflow
//!
//! 1. Flip the in-flight guard for the key (or bail out busy)
//! 2. Probe the network monitor; offline requests short-circuit to the
//!    snapshot store
//! 3. Run the caller-supplied fetch under the configured timeout
//! 4. On success, update pagination state and persist page 1
//! 5. On a page-1 network failure, recover from the snapshot
//! 6. Record the per-key pagination state and release the guard

use crate::error::{ListError, Result};
use crate::key::ResourceKey;
use crate::pagination::Page;
use bridge_traits::network::NetworkMonitor;
use core_cache::SnapshotStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Per-key fetch bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Whether a fetch for this key is currently running
    pub in_flight: bool,
    /// Last page successfully applied
    pub current_page: u32,
    /// Whether the server reports further pages
    pub has_more: bool,
    /// Message of the most recent failure, if any
    pub last_error: Option<String>,
}

/// Result of a [`FetchCoordinator::load`] call.
///
/// Recoverable failures are carried as a value in `error` alongside
/// whatever items could still be served (snapshot fallback); the outer
/// `Result` is reserved for `Busy` and `OfflineNoCache`, which produce no
/// items at all.
#[derive(Debug)]
pub struct LoadOutcome<T> {
    /// Items to apply. For `appended` outcomes these are only the new page.
    pub items: Vec<T>,
    /// Whether this outcome extends prior items (page > 1) instead of
    /// replacing them
    pub appended: bool,
    /// Whether the items came from the local snapshot
    pub degraded: bool,
    /// Whether further pages exist
    pub has_more: bool,
    /// Non-fatal failure carried with the outcome
    pub error: Option<ListError>,
}

/// Coordinates paginated fetches across resource keys.
///
/// Cross-key loads are fully independent: the state map lock is only held
/// for slot flips, never across an await.
pub struct FetchCoordinator {
    network: Arc<dyn NetworkMonitor>,
    store: Arc<dyn SnapshotStore>,
    fetch_timeout: Duration,
    states: Mutex<HashMap<ResourceKey, FetchState>>,
}

impl FetchCoordinator {
    pub fn new(
        network: Arc<dyn NetworkMonitor>,
        store: Arc<dyn SnapshotStore>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            network,
            store,
            fetch_timeout,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Load one page for `key` via `fetch`.
    ///
    /// `fetch` receives the page number and performs the remote call; the
    /// coordinator wraps it with the in-flight guard, the offline/cache
    /// fallback, and the fetch timeout.
    #[instrument(skip(self, fetch), fields(key = %key))]
    pub async fn load<T, F, Fut>(&self, key: &ResourceKey, page: u32, fetch: F) -> Result<LoadOutcome<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(u32) -> Fut + Send,
        Fut: Future<Output = Result<Page<T>>> + Send,
    {
        if !self.try_begin(key) {
            debug!(page, "Duplicate load dropped, fetch already in flight");
            return Err(ListError::Busy {
                key: key.to_string(),
            });
        }

        // Clears in_flight on every exit, including a dropped future.
        let _guard = InFlightGuard {
            coordinator: self,
            key,
        };

        let result = self.load_inner(key, page, fetch).await;
        self.record(key, page, &result);
        result
    }

    /// Snapshot of the fetch state for `key`, if the key is live.
    pub fn state(&self, key: &ResourceKey) -> Option<FetchState> {
        self.states
            .lock()
            .ok()
            .and_then(|states| states.get(key).cloned())
    }

    /// Whether a fetch for `key` is currently running.
    pub fn is_in_flight(&self, key: &ResourceKey) -> bool {
        self.state(key).map(|s| s.in_flight).unwrap_or(false)
    }

    /// Discard the state slot for `key` (screen unmount or filter change).
    /// The persisted snapshot is unaffected.
    pub fn release(&self, key: &ResourceKey) {
        if let Ok(mut states) = self.states.lock() {
            states.remove(key);
        }
    }

    fn try_begin(&self, key: &ResourceKey) -> bool {
        let mut states = match self.states.lock() {
            Ok(states) => states,
            Err(_) => return false,
        };
        let state = states.entry(key.clone()).or_default();
        if state.in_flight {
            false
        } else {
            state.in_flight = true;
            true
        }
    }

    fn end(&self, key: &ResourceKey) {
        if let Ok(mut states) = self.states.lock() {
            if let Some(state) = states.get_mut(key) {
                state.in_flight = false;
            }
        }
    }

    fn record<T>(&self, key: &ResourceKey, page: u32, result: &Result<LoadOutcome<T>>) {
        let Ok(mut states) = self.states.lock() else {
            return;
        };
        // The slot may have been released mid-flight (filter change,
        // screen unmount); a released key must stay released.
        let Some(state) = states.get_mut(key) else {
            return;
        };

        match result {
            Ok(outcome) => {
                if outcome.error.is_none() {
                    state.current_page = page;
                    state.last_error = None;
                } else {
                    state.last_error = outcome.error.as_ref().map(|e| e.to_string());
                }
                state.has_more = outcome.has_more;
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
            }
        }
    }

    async fn load_inner<T, F, Fut>(
        &self,
        key: &ResourceKey,
        page: u32,
        fetch: F,
    ) -> Result<LoadOutcome<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(u32) -> Fut + Send,
        Fut: Future<Output = Result<Page<T>>> + Send,
    {
        if !self.network.is_connected().await {
            debug!(page, "Offline, trying snapshot");
            return self.offline_outcome(key, None).await;
        }

        let fetched = match timeout(self.fetch_timeout, fetch(page)).await {
            Ok(result) => result,
            Err(_) => Err(ListError::Timeout(self.fetch_timeout.as_secs())),
        };

        match fetched {
            Ok(remote_page) => {
                let has_more = page < remote_page.total_pages;
                if page == 1 {
                    // Only the first page replaces the persisted snapshot;
                    // appends never touch it.
                    self.write_snapshot(key, &remote_page.items).await;
                }
                debug!(
                    page,
                    count = remote_page.items.len(),
                    has_more,
                    "Remote page fetched"
                );
                Ok(LoadOutcome {
                    items: remote_page.items,
                    appended: page > 1,
                    degraded: false,
                    has_more,
                    error: None,
                })
            }
            Err(err) if page == 1 && err.is_network() => {
                warn!(error = %err, "Page-1 fetch failed, falling back to snapshot");
                self.offline_outcome(key, Some(err)).await
            }
            Err(err) => {
                // Page > 1 failures are non-destructive: previously loaded
                // pages stay visible and has_more is left as it was.
                warn!(page, error = %err, "Load-more fetch failed, keeping existing items");
                let has_more = self.state(key).map(|s| s.has_more).unwrap_or(false);
                Ok(LoadOutcome {
                    items: Vec::new(),
                    appended: page > 1,
                    degraded: false,
                    has_more,
                    error: Some(err),
                })
            }
        }
    }

    /// Serve the snapshot for `key` in degraded mode, or surface the
    /// failure when there is nothing cached.
    async fn offline_outcome<T>(
        &self,
        key: &ResourceKey,
        cause: Option<ListError>,
    ) -> Result<LoadOutcome<T>>
    where
        T: DeserializeOwned + Send,
    {
        let cached: Vec<T> = self.read_snapshot(key).await;
        if cached.is_empty() {
            return match cause {
                Some(err) => Ok(LoadOutcome {
                    items: Vec::new(),
                    appended: false,
                    degraded: false,
                    has_more: false,
                    error: Some(err),
                }),
                None => Err(ListError::OfflineNoCache {
                    key: key.to_string(),
                }),
            };
        }

        debug!(key = %key, count = cached.len(), "Serving snapshot in degraded mode");
        Ok(LoadOutcome {
            items: cached,
            appended: false,
            degraded: true,
            has_more: false,
            error: cause,
        })
    }

    /// Read and decode the snapshot; any failure degrades to an empty
    /// snapshot rather than an error.
    async fn read_snapshot<T: DeserializeOwned>(&self, key: &ResourceKey) -> Vec<T> {
        let values = match self.store.get(&key.to_string()).await {
            Ok(values) => values,
            Err(e) => {
                warn!(key = %key, error = %e, "Snapshot read failed, treating as empty");
                return Vec::new();
            }
        };

        let mut items = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value(value) {
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(key = %key, error = %e, "Undecodable snapshot discarded");
                    return Vec::new();
                }
            }
        }
        items
    }

    /// Persist `items` as the new snapshot for `key`. Write failures are
    /// logged and swallowed; cache IO must never fail a fetch.
    async fn write_snapshot<T: Serialize>(&self, key: &ResourceKey, items: &[T]) {
        let mut values: Vec<Value> = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::to_value(item) {
                Ok(value) => values.push(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Snapshot serialization failed, skipping write");
                    return;
                }
            }
        }

        if let Err(e) = self.store.put(&key.to_string(), &values).await {
            warn!(key = %key, error = %e, "Snapshot write failed");
        }
    }
}

struct InFlightGuard<'a> {
    coordinator: &'a FetchCoordinator,
    key: &'a ResourceKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.end(self.key);
    }
}
