//! End-to-end flows through the controller, coordinator, remote client and
//! a real in-memory snapshot store. Only the platform bridges (HTTP,
//! network monitor) are substituted.

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::network::{NetworkChangeStream, NetworkMonitor, NetworkStatus};
use bridge_traits::BridgeError;
use bytes::Bytes;
use core_cache::{create_test_pool, SnapshotStore, SqliteSnapshotStore};
use core_list::controller::{ListController, ListItem};
use core_list::coordinator::FetchCoordinator;
use core_list::key::{ResourceKey, ResourceType};
use core_list::remote::RemoteListClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

const BASE_URL: &str = "https://api.test/v1";
const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestItem {
    id: String,
}

impl ListItem for TestItem {
    fn id(&self) -> &str {
        &self.id
    }
}

/// HTTP client answering from a scripted URL table. Unscripted URLs fail
/// like a dead connection.
struct ScriptedHttp {
    routes: Mutex<HashMap<String, (u16, String)>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: AtomicUsize,
}

impl ScriptedHttp {
    fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            delays: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn route(&self, url: &str, status: u16, body: String) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body));
    }

    fn delay_matching(&self, needle: &str, delay: Duration) {
        self.delays
            .lock()
            .unwrap()
            .push((needle.to_string(), delay));
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = {
            let delays = self.delays.lock().unwrap();
            delays
                .iter()
                .find(|(needle, _)| request.url.contains(needle))
                .map(|(_, d)| *d)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = { self.routes.lock().unwrap().get(&request.url).cloned() };
        match scripted {
            Some((status, body)) => Ok(HttpResponse {
                status,
                headers: HashMap::new(),
                body: Bytes::from(body),
            }),
            None => Err(BridgeError::Http(format!(
                "connection refused: {}",
                request.url
            ))),
        }
    }
}

/// Network monitor toggled from the test, with change notifications fanned
/// out to subscribers.
struct FakeMonitor {
    online: AtomicBool,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<NetworkStatus>>>,
}

impl FakeMonitor {
    fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        let status = if online {
            NetworkStatus::Connected
        } else {
            NetworkStatus::Disconnected
        };
        for tx in self.subscribers.lock().unwrap().iter() {
            let _ = tx.send(status);
        }
    }
}

struct ChannelStream(mpsc::UnboundedReceiver<NetworkStatus>);

#[async_trait]
impl NetworkChangeStream for ChannelStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        self.0.recv().await
    }
}

#[async_trait]
impl NetworkMonitor for FakeMonitor {
    async fn status(&self) -> NetworkStatus {
        if self.online.load(Ordering::SeqCst) {
            NetworkStatus::Connected
        } else {
            NetworkStatus::Disconnected
        }
    }

    async fn subscribe(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        Ok(Box::new(ChannelStream(rx)))
    }
}

struct Harness {
    http: Arc<ScriptedHttp>,
    monitor: Arc<FakeMonitor>,
    store: Arc<SqliteSnapshotStore>,
    coordinator: Arc<FetchCoordinator>,
    remote: Arc<RemoteListClient>,
}

impl Harness {
    async fn new() -> Self {
        let pool = create_test_pool().await.unwrap();
        let store = Arc::new(SqliteSnapshotStore::new(pool, 10));
        store.initialize().await.unwrap();

        let http = Arc::new(ScriptedHttp::new());
        let monitor = Arc::new(FakeMonitor::new(true));
        let coordinator = Arc::new(FetchCoordinator::new(
            monitor.clone(),
            store.clone(),
            Duration::from_secs(5),
        ));
        let remote = Arc::new(RemoteListClient::new(
            http.clone(),
            BASE_URL,
            Duration::from_secs(5),
        ));

        Self {
            http,
            monitor,
            store,
            coordinator,
            remote,
        }
    }

    fn controller(&self, key: ResourceKey) -> Arc<ListController<TestItem>> {
        Arc::new(ListController::new(
            self.coordinator.clone(),
            self.remote.clone(),
            key,
            PAGE_SIZE,
        ))
    }
}

fn gallery_key() -> ResourceKey {
    ResourceKey::new(ResourceType::Gallery)
}

fn gallery_url(page: u32) -> String {
    format!("{}/gallery?page={}&limit={}", BASE_URL, page, PAGE_SIZE)
}

fn page_body(ids: &[&str], page: u32, total: u64, total_pages: u32) -> String {
    json!({
        "success": true,
        "message": "ok",
        "data": {
            "images": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
            "pagination": {
                "page": page,
                "limit": PAGE_SIZE,
                "total": total,
                "totalPages": total_pages
            }
        }
    })
    .to_string()
}

fn ids(items: &[TestItem]) -> Vec<&str> {
    items.iter().map(|item| item.id.as_str()).collect()
}

#[tokio::test]
async fn test_refresh_populates_list_and_bounded_snapshot() {
    let harness = Harness::new().await;
    let many: Vec<String> = (1..=12).map(|i| format!("img-{:02}", i)).collect();
    let many_refs: Vec<&str> = many.iter().map(String::as_str).collect();
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&many_refs, 1, 57, 3));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;

    let state = controller.state();
    assert_eq!(state.items.len(), 12);
    assert_eq!(state.page, 1);
    assert!(state.has_more);
    assert!(!state.degraded);
    assert!(state.error.is_none());

    // The persisted snapshot is capped and keeps the leading items in order
    let snapshot = harness.store.get(&gallery_key().to_string()).await.unwrap();
    assert_eq!(snapshot.len(), 10);
    assert_eq!(snapshot[0]["id"], "img-01");
    assert_eq!(snapshot[9]["id"], "img-10");
}

#[tokio::test]
async fn test_refresh_replaces_items_wholesale() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a", "b"], 1, 2, 1));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    assert_eq!(ids(&controller.state().items), vec!["a", "b"]);

    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["c"], 1, 1, 1));
    controller.refresh().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["c"]);
    assert!(!state.has_more);
}

#[tokio::test]
async fn test_concurrent_refreshes_fetch_once() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a"], 1, 1, 1));
    harness
        .http
        .delay_matching("page=1", Duration::from_millis(50));

    let controller = harness.controller(gallery_key());
    tokio::join!(controller.refresh(), controller.refresh());

    assert_eq!(harness.http.calls(), 1);
    assert_eq!(ids(&controller.state().items), vec!["a"]);
}

#[tokio::test]
async fn test_load_more_appends_and_dedups() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a", "b", "c"], 1, 5, 2));
    // Overlap on "c" simulates an item shifting pages between requests
    harness
        .http
        .route(&gallery_url(2), 200, page_body(&["c", "d"], 2, 5, 2));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    controller.load_more().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["a", "b", "c", "d"]);
    assert_eq!(state.page, 2);
    assert!(!state.has_more);

    // Pagination never touches the snapshot; it still holds page 1 only
    let snapshot = harness.store.get(&gallery_key().to_string()).await.unwrap();
    assert_eq!(snapshot.len(), 3);
}

#[tokio::test]
async fn test_load_more_after_last_page_is_noop() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a"], 1, 1, 1));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    let calls_after_refresh = harness.http.calls();

    controller.load_more().await;
    assert_eq!(harness.http.calls(), calls_after_refresh);
}

#[tokio::test]
async fn test_failed_load_more_keeps_items_and_allows_retry() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a", "b"], 1, 4, 2));
    harness.http.route(&gallery_url(2), 500, String::new());

    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    controller.load_more().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["a", "b"]);
    assert_eq!(state.page, 1);
    assert!(state.has_more);
    assert!(state.error.is_some());

    // The endpoint recovers and the retry succeeds
    harness
        .http
        .route(&gallery_url(2), 200, page_body(&["c", "d"], 2, 4, 2));
    controller.load_more().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["a", "b", "c", "d"]);
    assert_eq!(state.page, 2);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_offline_refresh_serves_snapshot_without_fetching() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a", "b"], 1, 2, 1));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    let calls_while_online = harness.http.calls();

    harness.monitor.set_online(false);
    controller.refresh().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["a", "b"]);
    assert!(state.degraded);
    assert!(!state.has_more);
    assert_eq!(harness.http.calls(), calls_while_online);
}

#[tokio::test]
async fn test_offline_without_snapshot_reports_unavailable() {
    let harness = Harness::new().await;
    harness.monitor.set_online(false);

    let controller = harness.controller(gallery_key());
    controller.refresh().await;

    let state = controller.state();
    assert!(state.items.is_empty());
    assert!(state.degraded);
    assert!(state.error.is_some());
    assert_eq!(harness.http.calls(), 0);
}

#[tokio::test]
async fn test_server_error_on_refresh_falls_back_to_snapshot() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a"], 1, 1, 1));

    let controller = harness.controller(gallery_key());
    controller.refresh().await;

    harness.http.route(&gallery_url(1), 503, String::new());
    controller.refresh().await;

    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["a"]);
    assert!(state.degraded);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn test_filter_switch_discards_stale_result() {
    let harness = Harness::new().await;
    let slow_url = format!("{}/gallery?page=1&limit={}&category=old", BASE_URL, PAGE_SIZE);
    let fast_url = format!("{}/gallery?page=1&limit={}&category=new", BASE_URL, PAGE_SIZE);
    harness
        .http
        .route(&slow_url, 200, page_body(&["old-1"], 1, 1, 1));
    harness
        .http
        .route(&fast_url, 200, page_body(&["new-1"], 1, 1, 1));
    harness
        .http
        .delay_matching("category=old", Duration::from_millis(150));

    let controller = harness.controller(gallery_key().filter("category", "old"));

    let background = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut filters = BTreeMap::new();
    filters.insert("category".to_string(), "new".to_string());
    controller.set_filter(filters).await;
    background.await.unwrap();

    // The slow result for the old filter must never surface
    let state = controller.state();
    assert_eq!(ids(&state.items), vec!["new-1"]);
    assert_eq!(
        controller.key().filters().get("category").map(String::as_str),
        Some("new")
    );
}

#[tokio::test]
async fn test_set_filter_with_same_filters_is_noop() {
    let harness = Harness::new().await;
    let controller = harness.controller(gallery_key().filter("category", "7"));

    let mut same = BTreeMap::new();
    same.insert("category".to_string(), "7".to_string());
    controller.set_filter(same).await;

    assert_eq!(harness.http.calls(), 0);
    assert!(controller.state().items.is_empty());
}

#[tokio::test]
async fn test_reconnect_refreshes_degraded_list() {
    let harness = Harness::new().await;
    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a"], 1, 1, 1));

    let warm = harness.controller(gallery_key());
    warm.refresh().await;
    drop(warm);

    harness.monitor.set_online(false);
    let controller = harness.controller(gallery_key());
    controller.refresh().await;
    assert!(controller.state().degraded);

    let watcher = controller
        .spawn_refresh_on_reconnect(harness.monitor.clone())
        .await;

    harness
        .http
        .route(&gallery_url(1), 200, page_body(&["a", "b"], 1, 2, 1));

    // The subscription is registered before the watcher handle is returned,
    // so a transition fired immediately afterwards must not be lost
    harness.monitor.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let state = controller.state();
    assert!(!state.degraded);
    assert_eq!(ids(&state.items), vec!["a", "b"]);
    watcher.abort();
}
