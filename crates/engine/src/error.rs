use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("namespace {namespace} has no relation {relation}")]
    UnknownRelation { namespace: String, relation: String },

    #[error("dispatch budget exhausted before this sub-request could run")]
    DepthExceeded,

    #[error(transparent)]
    Storage(#[from] rebac_storage::StorageError),

    #[error("recursive dispatch failed: {0}")]
    DispatchFailed(String),
}
