use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid snapshot row: {0}")]
    InvalidRow(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
