use core_cache::CacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("Offline with no cached snapshot for {key}")]
    OfflineNoCache { key: String },

    #[error("Fetch already in flight for {key}")]
    Busy { key: String },

    #[error("Remote fetch failed: {0}")]
    NetworkFetch(String),

    #[error("Remote fetch timed out after {0} seconds")]
    Timeout(u64),

    #[error("Malformed list response: {0}")]
    InvalidResponse(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

impl ListError {
    /// Whether this error is network-shaped: the kind where falling back to
    /// the local snapshot is the right recovery for a page-1 load. The
    /// classification is by variant, decided at the point of invocation,
    /// never by matching on message text.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ListError::NetworkFetch(_) | ListError::Timeout(_) | ListError::InvalidResponse(_)
        )
    }
}

impl From<bridge_traits::BridgeError> for ListError {
    fn from(e: bridge_traits::BridgeError) -> Self {
        match e {
            bridge_traits::BridgeError::Timeout(secs) => ListError::Timeout(secs),
            other => ListError::NetworkFetch(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
