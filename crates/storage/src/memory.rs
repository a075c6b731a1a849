//! An in-memory `RevisionReader`, used only by this workspace's own tests.
//! Real deployments plug in an adapter over their relational or KV store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rebac_model::RelationTuple;

use crate::error::Result;
use crate::filter::RelationshipFilter;
use crate::reader::RevisionReader;

/// Tuples grouped by the revision at which they became visible. A query at
/// revision `N` sees every tuple recorded at a revision `<= N`.
#[derive(Default)]
pub struct InMemoryRevisionReader {
    revisions: RwLock<BTreeMap<u64, Vec<RelationTuple>>>,
}

impl InMemoryRevisionReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `tuples` as visible starting at `revision`.
    pub fn write_at(&self, revision: u64, tuples: Vec<RelationTuple>) {
        self.revisions
            .write()
            .expect("revision map lock poisoned")
            .insert(revision, tuples);
    }

    fn parse_revision(revision: &str) -> Option<u64> {
        revision.parse().ok()
    }
}

#[async_trait]
impl RevisionReader for InMemoryRevisionReader {
    async fn query_relationships(
        &self,
        revision: &str,
        filter: &RelationshipFilter,
    ) -> Result<Vec<RelationTuple>> {
        let Some(revision) = Self::parse_revision(revision) else {
            return Err(crate::error::StorageError::RevisionStale(revision.to_string()));
        };
        let guard = self.revisions.read().expect("revision map lock poisoned");
        let matches = guard
            .iter()
            .take_while(|(rev, _)| **rev <= revision)
            .flat_map(|(_, tuples)| tuples.iter())
            .filter(|tuple| filter.matches(tuple))
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn head_revision(&self) -> Result<String> {
        let guard = self.revisions.read().expect("revision map lock poisoned");
        Ok(guard.keys().next_back().copied().unwrap_or(0).to_string())
    }
}
