//! Engine facade wiring the snapshot database, fetch coordinator and
//! remote client together from one validated [`EngineConfig`].
//!
//! A host application builds one [`FeedEngine`] at startup and hands out
//! [`ListController`]s per screen. Controllers for different resource keys
//! are fully independent; they share only the coordinator's in-flight map,
//! the snapshot pool and the event bus.

use crate::controller::{ListController, ListItem};
use crate::coordinator::FetchCoordinator;
use crate::error::Result;
use crate::key::ResourceKey;
use crate::remote::RemoteListClient;
use bridge_traits::network::NetworkMonitor;
use core_cache::{create_pool, DatabaseConfig, SnapshotStore, SqliteSnapshotStore};
use core_runtime::config::EngineConfig;
use core_runtime::events::EventBus;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

const EVENT_BUS_CAPACITY: usize = 64;

/// Shared entry point of the list-synchronization engine.
pub struct FeedEngine {
    store: Arc<SqliteSnapshotStore>,
    coordinator: Arc<FetchCoordinator>,
    remote: Arc<RemoteListClient>,
    network: Arc<dyn NetworkMonitor>,
    events: EventBus,
    page_size: u32,
}

impl FeedEngine {
    /// Open the snapshot database and assemble the engine.
    #[instrument(skip(config), fields(database = %config.database_path.display()))]
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let pool = create_pool(DatabaseConfig::new(&config.database_path)).await?;
        let store = Arc::new(SqliteSnapshotStore::new(pool, config.snapshot_max_items));
        store.initialize().await?;

        let coordinator = Arc::new(FetchCoordinator::new(
            config.network_monitor.clone(),
            store.clone() as Arc<dyn SnapshotStore>,
            config.fetch_timeout,
        ));
        let remote = Arc::new(RemoteListClient::new(
            config.http_client.clone(),
            config.api_base_url.clone(),
            config.fetch_timeout,
        ));

        info!(api_base_url = %config.api_base_url, "List engine ready");

        Ok(Self {
            store,
            coordinator,
            remote,
            network: config.network_monitor,
            events: EventBus::new(EVENT_BUS_CAPACITY),
            page_size: config.page_size,
        })
    }

    /// Create a controller for one resource key.
    pub fn controller<T>(&self, key: ResourceKey) -> Arc<ListController<T>>
    where
        T: ListItem + Serialize + DeserializeOwned + 'static,
    {
        Arc::new(
            ListController::new(
                self.coordinator.clone(),
                self.remote.clone(),
                key,
                self.page_size,
            )
            .with_events(self.events.clone()),
        )
    }

    /// Create a controller that also refreshes itself on reconnect.
    pub async fn watching_controller<T>(&self, key: ResourceKey) -> Arc<ListController<T>>
    where
        T: ListItem + Serialize + DeserializeOwned + 'static,
    {
        let controller = self.controller(key);
        controller
            .spawn_refresh_on_reconnect(self.network.clone())
            .await;
        controller
    }

    /// The engine-wide event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The platform network monitor the engine was built with.
    pub fn network_monitor(&self) -> Arc<dyn NetworkMonitor> {
        self.network.clone()
    }

    /// Drop every persisted snapshot, e.g. on sign-out.
    pub async fn reset(&self) -> Result<()> {
        self.store.clear().await?;
        Ok(())
    }
}
