//! # Desktop Bridge Implementations
//!
//! Desktop implementations of the `bridge-traits` contracts:
//!
//! - [`DesktopNetworkMonitor`] - TCP-probe connectivity detection with a
//!   polling change stream
//! - [`ReqwestHttpClient`] - HTTP client backed by reqwest with bounded
//!   timeouts
//!
//! Mobile and web hosts ship their own adapter crates; the core only ever
//! sees the traits.

pub mod http;
pub mod network;

pub use http::ReqwestHttpClient;
pub use network::{subscribe_callback, DesktopNetworkMonitor, NetworkSubscription};
