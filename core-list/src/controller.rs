//! # List Controller
//!
//! Per-screen orchestrator composing the network monitor, fetch coordinator
//! and snapshot store into one observable list state.
//!
//! ## State machine (per resource key)
//!
//! ```text
//! Idle -> Loading(page 1) -> { Loaded | Degraded | Errored }
//! Loaded -> LoadingMore -> { AppendedLoaded | Errored(non-destructive) }
//! ```
//!
//! `Errored` on page 1 is terminal until the caller retries explicitly via
//! [`refresh`](ListController::refresh); nothing auto-retries. A filter
//! change is an explicit transition: it discards the old key's fetch state,
//! clears the visible items and starts a fresh page-1 load under the new
//! key. A result computed for the old key that lands after the switch is
//! discarded by a key-equality check at apply time, so the visible items
//! always belong to the current filter.
//!
//! The controller never talks to the network or the cache directly; all
//! I/O goes through the [`FetchCoordinator`].

use crate::coordinator::{FetchCoordinator, LoadOutcome};
use crate::error::{ListError, Result};
use crate::key::ResourceKey;
use crate::pagination::PageRequest;
use crate::remote::PageFetcher;
use bridge_traits::network::NetworkMonitor;
use core_runtime::events::{CoreEvent, EventBus, ListEvent, NetworkEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::debug;

/// An item in a remote list. The engine only ever looks at the stable
/// unique id, used for append de-duplication.
pub trait ListItem: Clone + Send + Sync {
    fn id(&self) -> &str;
}

/// Observable list state consumed by the UI layer.
#[derive(Debug, Clone)]
pub struct ListState<T> {
    /// Items in server order, page 1 first
    pub items: Vec<T>,
    /// True only while the very first page of a fresh key is in flight
    pub loading: bool,
    /// True while a page > 1 load is in flight
    pub loading_more: bool,
    /// Last page applied (0 before the first load)
    pub page: u32,
    /// Whether further pages exist
    pub has_more: bool,
    /// Whether `items` came from the local snapshot
    pub degraded: bool,
    /// Non-fatal error notice for the UI, if any
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            loading_more: false,
            page: 0,
            has_more: false,
            degraded: false,
            error: None,
        }
    }
}

struct Inner<T> {
    key: ResourceKey,
    state: ListState<T>,
}

/// Per-screen list controller.
///
/// Methods take `&self`; internal state sits behind a mutex whose lock is
/// never held across an await. The single-in-flight guard in the
/// coordinator serializes rapid duplicate calls.
pub struct ListController<T: ListItem> {
    coordinator: Arc<FetchCoordinator>,
    fetcher: Arc<dyn PageFetcher<T>>,
    page_size: u32,
    events: Option<EventBus>,
    inner: Mutex<Inner<T>>,
}

impl<T> ListController<T>
where
    T: ListItem + Serialize + DeserializeOwned + 'static,
{
    pub fn new(
        coordinator: Arc<FetchCoordinator>,
        fetcher: Arc<dyn PageFetcher<T>>,
        key: ResourceKey,
        page_size: u32,
    ) -> Self {
        Self {
            coordinator,
            fetcher,
            page_size,
            events: None,
            inner: Mutex::new(Inner {
                key,
                state: ListState::default(),
            }),
        }
    }

    /// Attach an event bus; list transitions are mirrored onto it.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// The resource key currently driving this controller.
    pub fn key(&self) -> ResourceKey {
        self.lock().key.clone()
    }

    /// Snapshot of the observable state.
    pub fn state(&self) -> ListState<T> {
        self.lock().state.clone()
    }

    /// Reset to page 1 for the current key and replace the items wholesale
    /// on completion.
    pub async fn refresh(&self) {
        let key = {
            let mut inner = self.lock();
            inner.state.loading = inner.state.items.is_empty();
            inner.key.clone()
        };

        let result = self.load_page(&key, 1).await;

        let mut inner = self.lock();
        if inner.key != key {
            // Filter changed while this load was in flight
            debug!(stale = %key, current = %inner.key, "Discarding stale page-1 result");
            return;
        }

        match result {
            Ok(outcome) => {
                inner.state.loading = false;
                inner.state.items = outcome.items;
                inner.state.page = 1;
                inner.state.has_more = outcome.has_more;
                inner.state.degraded = outcome.degraded;
                inner.state.error = outcome.error.as_ref().map(|e| e.to_string());

                let item_count = inner.state.items.len() as u32;
                let degraded = inner.state.degraded;
                drop(inner);
                if degraded {
                    self.emit(ListEvent::Degraded {
                        key: key.to_string(),
                        item_count,
                    });
                } else {
                    self.emit(ListEvent::Refreshed {
                        key: key.to_string(),
                        item_count,
                        degraded,
                    });
                }
            }
            Err(ListError::Busy { .. }) => {
                // Duplicate request dropped; the winning load owns the flags
            }
            Err(err) => {
                inner.state.loading = false;
                inner.state.items = Vec::new();
                inner.state.page = 1;
                inner.state.has_more = false;
                inner.state.degraded = true;
                inner.state.error = Some(err.to_string());
                drop(inner);
                self.emit(ListEvent::Failed {
                    key: key.to_string(),
                    message: err.to_string(),
                    recoverable: false,
                });
            }
        }
    }

    /// Request the next page and append it on success. No-op while a load
    /// is already running or when the server reports no further pages.
    pub async fn load_more(&self) {
        let (key, next_page) = {
            let mut inner = self.lock();
            if inner.state.loading || inner.state.loading_more || !inner.state.has_more {
                return;
            }
            inner.state.loading_more = true;
            (inner.key.clone(), inner.state.page + 1)
        };

        let result = self.load_page(&key, next_page).await;

        let mut inner = self.lock();
        if inner.key != key {
            debug!(stale = %key, current = %inner.key, "Discarding stale append result");
            return;
        }
        inner.state.loading_more = false;

        match result {
            Ok(outcome) if outcome.degraded => {
                // Went offline mid-scroll: the snapshot only covers page 1,
                // so keep what is already visible and stop paging.
                inner.state.has_more = false;
                inner.state.degraded = true;
            }
            Ok(outcome) => {
                inner.state.has_more = outcome.has_more;
                match outcome.error {
                    None => {
                        let added = merge_by_id(&mut inner.state.items, outcome.items);
                        inner.state.page = next_page;
                        inner.state.error = None;

                        let item_count = inner.state.items.len() as u32;
                        drop(inner);
                        self.emit(ListEvent::Appended {
                            key: key.to_string(),
                            items_added: added,
                            item_count,
                        });
                    }
                    Some(err) => {
                        // Non-destructive: already-rendered pages stay put
                        inner.state.error = Some(err.to_string());
                        drop(inner);
                        self.emit(ListEvent::Failed {
                            key: key.to_string(),
                            message: err.to_string(),
                            recoverable: true,
                        });
                    }
                }
            }
            Err(ListError::Busy { .. }) => {}
            Err(err) => {
                inner.state.error = Some(err.to_string());
            }
        }
    }

    /// Replace the active filters. If the resulting key differs from the
    /// current one, the visible items are cleared and a fresh page-1 load
    /// starts; otherwise this is a no-op.
    pub async fn set_filter(&self, filters: BTreeMap<String, String>) {
        let changed = {
            let mut inner = self.lock();
            let new_key = ResourceKey::with_filters(inner.key.resource().clone(), filters);
            if new_key == inner.key {
                false
            } else {
                debug!(from = %inner.key, to = %new_key, "Filter change, resetting list");
                self.coordinator.release(&inner.key);
                inner.key = new_key;
                inner.state = ListState::default();
                true
            }
        };

        if changed {
            self.refresh().await;
        }
    }

    /// Refresh whenever connectivity returns.
    ///
    /// The watcher holds only a weak reference: tearing down the controller
    /// ends the task, and a transition observed mid-teardown is dropped
    /// instead of being applied to a dead controller.
    pub async fn spawn_refresh_on_reconnect(
        self: &Arc<Self>,
        monitor: Arc<dyn NetworkMonitor>,
    ) -> JoinHandle<()> {
        // Subscribe before spawning: a transition arriving between this
        // call and the watcher's first poll is queued on the stream
        // instead of lost.
        let stream = match monitor.subscribe().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                debug!(error = %e, "Connectivity subscription unavailable");
                None
            }
        };

        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };

            while let Some(status) = stream.next().await {
                let Some(controller) = weak.upgrade() else {
                    break;
                };
                if let Some(bus) = &controller.events {
                    bus.emit(CoreEvent::Network(NetworkEvent::ConnectivityChanged {
                        connected: status.is_connected(),
                    }));
                }
                if status.is_connected() {
                    controller.refresh().await;
                }
            }
        })
    }

    async fn load_page(&self, key: &ResourceKey, page: u32) -> Result<LoadOutcome<T>> {
        let fetcher = self.fetcher.clone();
        let fetch_key = key.clone();
        let page_size = self.page_size;

        self.coordinator
            .load(key, page, move |p| async move {
                fetcher
                    .fetch_page(&fetch_key, PageRequest::new(p, page_size))
                    .await
            })
            .await
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        // A poisoned lock only means a panicked holder; the state itself
        // stays usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: ListEvent) {
        if let Some(bus) = &self.events {
            bus.emit(CoreEvent::List(event));
        }
    }
}

impl<T: ListItem> Drop for ListController<T> {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            self.coordinator.release(&inner.key);
        }
    }
}

/// Append `new_items` to `existing`, skipping ids already present. Prior
/// items keep their positions; new items keep server order.
fn merge_by_id<T: ListItem>(existing: &mut Vec<T>, new_items: Vec<T>) -> u32 {
    let mut seen: HashSet<String> = existing.iter().map(|item| item.id().to_string()).collect();
    let mut added = 0;
    for item in new_items {
        if seen.insert(item.id().to_string()) {
            existing.push(item);
            added += 1;
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        id: String,
    }

    impl ListItem for TestItem {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn items(ids: &[&str]) -> Vec<TestItem> {
        ids.iter()
            .map(|id| TestItem { id: id.to_string() })
            .collect()
    }

    #[test]
    fn test_merge_dedups_by_id() {
        let mut existing = items(&["i1", "i2"]);
        let added = merge_by_id(&mut existing, items(&["i2", "i3"]));

        assert_eq!(added, 1);
        assert_eq!(existing, items(&["i1", "i2", "i3"]));
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut existing = items(&["a"]);
        merge_by_id(&mut existing, items(&["c", "b"]));
        assert_eq!(existing, items(&["a", "c", "b"]));
    }

    #[test]
    fn test_merge_skips_duplicates_within_new_page() {
        let mut existing = items(&[]);
        let added = merge_by_id(&mut existing, items(&["x", "x", "y"]));
        assert_eq!(added, 2);
        assert_eq!(existing, items(&["x", "y"]));
    }

    #[test]
    fn test_default_state_is_idle() {
        let state: ListState<TestItem> = ListState::default();
        assert!(state.items.is_empty());
        assert!(!state.loading);
        assert!(!state.has_more);
        assert_eq!(state.page, 0);
    }
}
