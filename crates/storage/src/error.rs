use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors the storage layer may report back to the dispatch engine. These
/// map directly onto the `REVISION_STALE` / `INTERNAL` machine codes of
/// the machine error codes.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("revision {0} is no longer available")]
    RevisionStale(String),

    #[error("unknown namespace or relation at the pinned revision: {0}")]
    UnknownSchemaElement(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
