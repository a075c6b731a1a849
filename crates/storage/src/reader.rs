//! The `RevisionReader` contract: the only thing the dispatch engine
//! consumes from the storage layer.

use async_trait::async_trait;
use rebac_model::RelationTuple;

use crate::error::Result;
use crate::filter::RelationshipFilter;

/// A snapshot reader of tuples at a pinned revision. Implementations must
/// return a consistent view of the named revision; they own no mutation
/// surface — writes happen entirely outside this crate's concern.
#[async_trait]
pub trait RevisionReader: Send + Sync {
    /// Returns every tuple at `revision` matching `filter`. Implementations
    /// may stream internally but this contract returns a materialized
    /// snapshot — it is the caller's job to chunk further if needed.
    async fn query_relationships(
        &self,
        revision: &str,
        filter: &RelationshipFilter,
    ) -> Result<Vec<RelationTuple>>;

    /// The most recent revision token, used only when the caller did not
    /// pin one.
    async fn head_revision(&self) -> Result<String>;
}
