//! # Core Runtime
//!
//! Ambient runtime services for the Feed Platform Core:
//!
//! - [`config`] - validated engine configuration with fail-fast builder
//! - [`events`] - typed broadcast event bus
//! - [`logging`] - tracing subscriber setup
//!
//! These are shared by every engine crate; nothing here knows about lists,
//! pagination, or caching specifics.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{EngineConfig, EngineConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, ListEvent, NetworkEvent};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
