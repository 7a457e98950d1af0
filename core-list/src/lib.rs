//! # List Synchronization Engine
//!
//! Resilient remote-list loading for client applications: paginated fetches
//! over flaky connectivity, a bounded persisted snapshot per list for
//! offline fallback, and per-screen controllers exposing a single
//! observable state.
//!
//! ## Architecture
//!
//! - [`key`] - resource keys: resource type plus sorted filters, the unit
//!   of cache partitioning and request de-duplication
//! - [`pagination`] - page requests and server-reported page metadata
//! - [`remote`] - the HTTP list client and response envelope decoding
//! - [`coordinator`] - connectivity gating, single-in-flight guard,
//!   timeout enforcement and snapshot fallback
//! - [`controller`] - the per-screen state machine (refresh, load-more,
//!   filter changes)
//! - [`engine`] - the wiring facade built from an `EngineConfig`
//!
//! ## Degraded mode
//!
//! When the device is offline or a page-1 fetch fails with a network
//! error, a list falls back to its persisted snapshot and is marked
//! degraded. Degraded lists never paginate; the next successful refresh
//! clears the flag.

pub mod controller;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod key;
pub mod pagination;
pub mod remote;

pub use controller::{ListController, ListItem, ListState};
pub use coordinator::{FetchCoordinator, FetchState, LoadOutcome};
pub use engine::FeedEngine;
pub use error::{ListError, Result};
pub use key::{ResourceKey, ResourceType};
pub use pagination::{Page, PageRequest};
pub use remote::{PageFetcher, RemoteListClient};
