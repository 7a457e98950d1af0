//! Runtime service errors: configuration validation and bridge wiring.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value failed fail-fast validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required platform bridge was neither injected nor available as a
    /// built-in shim.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
