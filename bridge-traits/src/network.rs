//! Network Monitoring Abstraction
//!
//! Provides network connectivity information and change subscription.

use crate::error::Result;

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
}

impl NetworkStatus {
    pub fn is_connected(self) -> bool {
        self == NetworkStatus::Connected
    }
}

/// Network monitor trait
///
/// Lets the core decide whether a remote fetch is worth attempting and lets
/// callers refresh a list when connectivity returns.
///
/// # Failure semantics
///
/// A failing probe means the network is unusable for our purposes, so
/// `status()` reports `Disconnected` rather than an error. Implementations
/// must never propagate probe failures.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::{NetworkMonitor, NetworkStatus};
///
/// async fn should_fetch(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.status().await.is_connected()
/// }
/// ```
#[async_trait::async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Best-effort reachability check. Probe failure reports `Disconnected`.
    async fn status(&self) -> NetworkStatus;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        self.status().await.is_connected()
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of status transitions. Implementations must emit at
    /// most one event per actual state change: no duplicate `Connected`
    /// while already connected.
    async fn subscribe(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status transitions
#[async_trait::async_trait]
pub trait NetworkChangeStream: Send {
    /// Get the next status transition
    ///
    /// Returns `None` when the stream is closed. Calling `next` after the
    /// stream is closed is a no-op, not an error.
    async fn next(&mut self) -> Option<NetworkStatus>;
}
