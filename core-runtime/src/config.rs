//! # Engine Configuration Module
//!
//! Builder-pattern configuration for the list-synchronization engine. The
//! builder enforces fail-fast validation so a misconfigured engine refuses
//! to construct instead of misbehaving at runtime.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - remote list fetching
//! - `NetworkMonitor` - connectivity gating
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! both are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::EngineConfig;
//!
//! let config = EngineConfig::builder()
//!     .database_path("/path/to/feed.db")
//!     .api_base_url("https://api.example.com/v1")
//!     .fetch_timeout_secs(20)
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, NetworkMonitor};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Hard cap on items kept per cache snapshot.
pub const DEFAULT_SNAPSHOT_MAX_ITEMS: usize = 10;

/// Default bound on a single remote fetch.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

/// Default page size requested from remote list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Engine configuration.
///
/// Holds the dependencies and settings required to run the engine. Use
/// [`EngineConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct EngineConfig {
    /// Path to the SQLite snapshot database file
    pub database_path: PathBuf,

    /// Base URL of the remote list API
    pub api_base_url: String,

    /// Upper bound on a single remote fetch
    pub fetch_timeout: Duration,

    /// Items kept per cache snapshot
    pub snapshot_max_items: usize,

    /// Page size requested from remote list endpoints
    pub page_size: u32,

    /// HTTP client for remote fetches
    pub http_client: Arc<dyn HttpClient>,

    /// Network connectivity monitor
    pub network_monitor: Arc<dyn NetworkMonitor>,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("database_path", &self.database_path)
            .field("api_base_url", &self.api_base_url)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("snapshot_max_items", &self.snapshot_max_items)
            .field("page_size", &self.page_size)
            .field("http_client", &"HttpClient { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .finish()
    }
}

impl EngineConfig {
    /// Start building an engine configuration.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Default)]
pub struct EngineConfigBuilder {
    database_path: Option<PathBuf>,
    api_base_url: Option<String>,
    fetch_timeout_secs: Option<u64>,
    snapshot_max_items: Option<usize>,
    page_size: Option<u32>,
    http_client: Option<Arc<dyn HttpClient>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
}

impl EngineConfigBuilder {
    /// Set the SQLite snapshot database path (required)
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Set the remote API base URL (required)
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the remote fetch timeout in seconds
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch_timeout_secs = Some(secs);
        self
    }

    /// Set the per-snapshot item cap
    pub fn snapshot_max_items(mut self, max: usize) -> Self {
        self.snapshot_max_items = Some(max);
        self
    }

    /// Set the remote page size
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Provide a custom HTTP client
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Provide a custom network monitor
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<EngineConfig> {
        let database_path = self
            .database_path
            .ok_or_else(|| Error::Config("database_path is required".to_string()))?;

        let api_base_url = self
            .api_base_url
            .ok_or_else(|| Error::Config("api_base_url is required".to_string()))?;
        if api_base_url.is_empty() {
            return Err(Error::Config("api_base_url cannot be empty".to_string()));
        }

        let fetch_timeout_secs = self.fetch_timeout_secs.unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS);
        if !(1..=120).contains(&fetch_timeout_secs) {
            return Err(Error::Config(format!(
                "fetch_timeout_secs must be within 1..=120, got {}",
                fetch_timeout_secs
            )));
        }

        let snapshot_max_items = self.snapshot_max_items.unwrap_or(DEFAULT_SNAPSHOT_MAX_ITEMS);
        if snapshot_max_items == 0 {
            return Err(Error::Config(
                "snapshot_max_items must be at least 1".to_string(),
            ));
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=100).contains(&page_size) {
            return Err(Error::Config(format!(
                "page_size must be within 1..=100, got {}",
                page_size
            )));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => default_http_client()?,
        };

        let network_monitor = match self.network_monitor {
            Some(monitor) => monitor,
            None => default_network_monitor()?,
        };

        Ok(EngineConfig {
            database_path,
            api_base_url,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            snapshot_max_items,
            page_size,
            http_client,
            network_monitor,
        })
    }
}

#[cfg(feature = "desktop-shims")]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    let client = bridge_desktop::ReqwestHttpClient::new()
        .map_err(|e| Error::Config(format!("Failed to build default HTTP client: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Desktop: enable the desktop-shims feature. \
                  Mobile: inject a platform-native adapter."
            .to_string(),
    })
}

#[cfg(feature = "desktop-shims")]
fn default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Ok(Arc::new(bridge_desktop::DesktopNetworkMonitor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Err(Error::CapabilityMissing {
        capability: "NetworkMonitor".to_string(),
        message: "No network monitor implementation provided. \
                  Desktop: enable the desktop-shims feature. \
                  Mobile: inject a platform-native adapter."
            .to_string(),
    })
}
