//! # Event Bus System
//!
//! Provides an event-driven architecture for the Feed Platform Core using
//! `tokio::sync::broadcast`. Modules publish typed events; hosts subscribe
//! to drive UI updates (spinners, offline banners, list refreshes) without
//! coupling to engine internals.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, ListEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::List(ListEvent::Refreshed {
//!     key: "gallery:status=approved".to_string(),
//!     item_count: 10,
//!     degraded: false,
//! }));
//! ```
//!
//! ## Error Handling
//!
//! `tokio::sync::broadcast` can produce two receive errors:
//!
//! - `RecvError::Lagged(n)`: the subscriber missed `n` events. Non-fatal;
//!   the subscriber keeps receiving new events.
//! - `RecvError::Closed`: all senders dropped, signalling shutdown.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Connectivity-related events
    Network(NetworkEvent),
    /// List lifecycle events
    List(ListEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Network(e) => e.description(),
            CoreEvent::List(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::List(ListEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::List(ListEvent::Degraded { .. }) => EventSeverity::Warning,
            CoreEvent::Network(NetworkEvent::ConnectivityChanged { connected: false }) => {
                EventSeverity::Warning
            }
            _ => EventSeverity::Info,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events related to network connectivity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NetworkEvent {
    /// Connectivity state transitioned. Emitted at most once per actual
    /// change.
    ConnectivityChanged {
        /// Whether the device is now connected.
        connected: bool,
    },
}

impl NetworkEvent {
    fn description(&self) -> &str {
        match self {
            NetworkEvent::ConnectivityChanged { connected: true } => "Network connected",
            NetworkEvent::ConnectivityChanged { connected: false } => "Network disconnected",
        }
    }
}

/// Events related to list fetching and cache fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ListEvent {
    /// A fresh page-1 load completed and replaced the visible items.
    Refreshed {
        /// Serialized resource key of the list.
        key: String,
        /// Number of items now visible.
        item_count: u32,
        /// Whether the items came from the local snapshot instead of the
        /// remote endpoint.
        degraded: bool,
    },
    /// A page > 1 load completed and extended the visible items.
    Appended {
        /// Serialized resource key of the list.
        key: String,
        /// Number of items added after de-duplication.
        items_added: u32,
        /// Number of items now visible.
        item_count: u32,
    },
    /// The list is being served from the local snapshot.
    Degraded {
        /// Serialized resource key of the list.
        key: String,
        /// Number of snapshot items served.
        item_count: u32,
    },
    /// A load failed with no local fallback.
    Failed {
        /// Serialized resource key of the list.
        key: String,
        /// Human-readable error message.
        message: String,
        /// Whether a retry is worthwhile (network errors) or pointless
        /// until conditions change (offline with no snapshot).
        recoverable: bool,
    },
}

impl ListEvent {
    fn description(&self) -> &str {
        match self {
            ListEvent::Refreshed { .. } => "List refreshed",
            ListEvent::Appended { .. } => "List page appended",
            ListEvent::Degraded { .. } => "List served from snapshot",
            ListEvent::Failed { .. } => "List load failed",
        }
    }
}

/// Central event bus for publishing and subscribing to core events.
///
/// Cheap to clone; all clones publish into the same channel. Fully
/// `Send + Sync`, safe to share across tasks via `Arc`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel buffer size.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received the event. An event
    /// emitted with no subscribers is silently dropped, which is fine: the
    /// bus is observability, not control flow.
    pub fn emit(&self, event: CoreEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
