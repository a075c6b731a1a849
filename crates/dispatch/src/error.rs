//! The canonical error carrier for all five dispatch calls.
//! Every machine code a caller can observe originates here; the RPC layer
//! (`rebac-rpc`) maps these onto wire status codes.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("dispatch depth budget exhausted")]
    DepthExceeded,

    #[error("revision is no longer available: {0}")]
    RevisionStale(String),

    #[error("peer unavailable: {0}")]
    PeerUnavailable(String),

    #[error("request canceled")]
    Canceled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<rebac_engine::EngineError> for DispatchError {
    fn from(err: rebac_engine::EngineError) -> Self {
        match err {
            rebac_engine::EngineError::DepthExceeded => DispatchError::DepthExceeded,
            rebac_engine::EngineError::UnknownNamespace(_)
            | rebac_engine::EngineError::UnknownRelation { .. } => {
                DispatchError::InvalidArgument(err.to_string())
            }
            rebac_engine::EngineError::Storage(storage_err) => {
                DispatchError::from(storage_err)
            }
            rebac_engine::EngineError::DispatchFailed(message) => DispatchError::Internal(message),
        }
    }
}

impl From<rebac_storage::StorageError> for DispatchError {
    fn from(err: rebac_storage::StorageError) -> Self {
        match err {
            rebac_storage::StorageError::RevisionStale(rev) => DispatchError::RevisionStale(rev),
            rebac_storage::StorageError::UnknownSchemaElement(message) => {
                DispatchError::InvalidArgument(message)
            }
            rebac_storage::StorageError::Backend(message) => DispatchError::Internal(message),
        }
    }
}

impl From<rebac_ring::RingError> for DispatchError {
    fn from(err: rebac_ring::RingError) -> Self {
        DispatchError::PeerUnavailable(err.to_string())
    }
}

impl From<rebac_cache::CacheError> for DispatchError {
    fn from(err: rebac_cache::CacheError) -> Self {
        DispatchError::Internal(err.to_string())
    }
}

/// The reverse direction: a `DispatchError` surfacing from a recursive call
/// made through the [`rebac_engine::Dispatch`] seam has to come back as an
/// `EngineError` so the evaluator's `?` keeps type-checking.
pub(crate) fn as_engine_error(err: DispatchError) -> rebac_engine::EngineError {
    match err {
        DispatchError::DepthExceeded => rebac_engine::EngineError::DepthExceeded,
        other => rebac_engine::EngineError::DispatchFailed(other.to_string()),
    }
}
