//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkMonitor, NetworkStatus},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

const DEFAULT_PROBE_ADDR: &str = "8.8.8.8:53";
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Desktop network monitor implementation
///
/// Provides basic network connectivity detection by attempting a TCP
/// connection to a well-known endpoint.
///
/// Note: Platform-specific implementations (Linux netlink, macOS
/// SystemConfiguration, Windows WinAPI) would be more robust but require
/// additional dependencies.
pub struct DesktopNetworkMonitor {
    probe_addr: String,
}

impl DesktopNetworkMonitor {
    /// Create a new network monitor probing the default endpoint
    pub fn new() -> Self {
        Self::with_probe_addr(DEFAULT_PROBE_ADDR)
    }

    /// Create a monitor probing a custom `host:port` endpoint
    pub fn with_probe_addr(addr: impl Into<String>) -> Self {
        Self {
            probe_addr: addr.into(),
        }
    }

    /// Check connectivity by attempting a bounded TCP connect.
    /// A failing or hanging probe reports `Disconnected`, never an error.
    async fn check_connectivity(&self) -> NetworkStatus {
        match tokio::time::timeout(
            PROBE_TIMEOUT,
            tokio::net::TcpStream::connect(&self.probe_addr),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) => NetworkStatus::Disconnected,
            Err(_) => NetworkStatus::Disconnected,
        }
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn status(&self) -> NetworkStatus {
        let status = self.check_connectivity().await;
        debug!(status = ?status, "Network status probed");
        status
    }

    async fn subscribe(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(DesktopNetworkChangeStream {
            monitor: Self::with_probe_addr(self.probe_addr.clone()),
            last_status: None,
        }))
    }
}

/// Network change stream that polls for transitions
///
/// A production implementation would hook platform-specific APIs to watch
/// for changes instead of polling.
struct DesktopNetworkChangeStream {
    monitor: DesktopNetworkMonitor,
    last_status: Option<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for DesktopNetworkChangeStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        // Only yield when the status actually changed
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let status = self.monitor.status().await;
            if self.last_status != Some(status) {
                self.last_status = Some(status);
                return Some(status);
            }
        }
    }
}

/// Handle to an active connectivity callback subscription.
///
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe))
/// stops the watcher task; any transition observed afterwards is simply
/// never delivered, so a late callback can never fire into dead state.
pub struct NetworkSubscription {
    handle: JoinHandle<()>,
}

impl NetworkSubscription {
    /// Stop receiving connectivity callbacks
    pub fn unsubscribe(self) {
        self.handle.abort();
    }
}

impl Drop for NetworkSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Subscribe a callback to connectivity transitions.
///
/// The callback receives `true` on regain and `false` on loss, at most once
/// per actual state change. Requires a tokio runtime.
pub fn subscribe_callback<F>(
    monitor: Arc<dyn NetworkMonitor>,
    callback: F,
) -> NetworkSubscription
where
    F: Fn(bool) + Send + Sync + 'static,
{
    let handle = tokio::spawn(async move {
        let mut stream = match monitor.subscribe().await {
            Ok(stream) => stream,
            Err(e) => {
                debug!(error = %e, "Network subscription unavailable");
                return;
            }
        };

        while let Some(status) = stream.next().await {
            callback(status.is_connected());
        }
    });

    NetworkSubscription { handle }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_failure_reports_disconnected() {
        // Reserved TEST-NET-1 address: the connect attempt cannot succeed
        let monitor = DesktopNetworkMonitor::with_probe_addr("192.0.2.1:9");
        let status = monitor.status().await;
        assert_eq!(status, NetworkStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribe_constructs_stream() {
        let monitor = DesktopNetworkMonitor::new();
        let _stream = monitor.subscribe().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_callbacks() {
        let monitor: Arc<dyn NetworkMonitor> =
            Arc::new(DesktopNetworkMonitor::with_probe_addr("192.0.2.1:9"));
        let subscription = subscribe_callback(monitor, |_| {
            panic!("callback after unsubscribe");
        });
        subscription.unsubscribe();
        // Aborted task must not deliver anything afterwards
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
