use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("single-flight computation for this key failed: {0}")]
    ComputeFailed(String),

    #[error("cache entry failed to serialize for cost accounting: {0}")]
    Serialization(#[from] serde_json::Error),
}
