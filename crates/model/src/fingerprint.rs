//! The canonical dispatch key and its fingerprint.
//!
//! The same fingerprint is used both to pick a peer on the consistent-hash
//! ring (`rebac-ring`) and to key the dispatch cache (`rebac-cache`), so it
//! lives here where both can share it without depending on each other.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::tuple::RelationReference;

/// The kind of dispatch call a key was built for. Distinguishing these
/// prevents, e.g., a `Check` and an `Expand` over the same resource/subject
/// from colliding in the cache or the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchKind {
    Check,
    Expand,
    ReachableResources,
    LookupResources,
    LookupSubjects,
}

impl DispatchKind {
    fn tag(self) -> &'static str {
        match self {
            DispatchKind::Check => "check",
            DispatchKind::Expand => "expand",
            DispatchKind::ReachableResources => "reachable_resources",
            DispatchKind::LookupResources => "lookup_resources",
            DispatchKind::LookupSubjects => "lookup_subjects",
        }
    }
}

/// The inputs that determine where a sub-request is routed and whether it
/// can be served from cache. Construction is order-insensitive in
/// `resource_ids` (they are sorted before hashing) so that two requests for
/// the same set expressed in different orders still land on the same peer
/// and hit the same cache entry.
#[derive(Debug, Clone)]
pub struct DispatchKey {
    pub kind: DispatchKind,
    pub at_revision: String,
    pub resource_relation: RelationReference,
    pub resource_ids: Vec<String>,
    pub subject_namespace: String,
    pub subject_object_id: String,
    pub subject_relation: Option<String>,
    /// Operator-specific extra fields folded into the key, e.g. a hash of
    /// the caller-supplied context for caveated requests.
    pub extra: Vec<String>,
}

impl DispatchKey {
    /// The deterministic canonical byte string this hashes over.
    #[must_use]
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut resource_ids = self.resource_ids.clone();
        resource_ids.sort_unstable();
        resource_ids.dedup();

        let mut buf = String::new();
        buf.push_str(self.kind.tag());
        buf.push('\u{1}');
        buf.push_str(&self.at_revision);
        buf.push('\u{1}');
        buf.push_str(&self.resource_relation.namespace);
        buf.push('#');
        buf.push_str(&self.resource_relation.relation);
        buf.push('\u{1}');
        buf.push_str(&resource_ids.join("\u{2}"));
        buf.push('\u{1}');
        buf.push_str(&self.subject_namespace);
        buf.push(':');
        buf.push_str(&self.subject_object_id);
        if let Some(rel) = &self.subject_relation {
            buf.push('#');
            buf.push_str(rel);
        }
        buf.push('\u{1}');
        let mut extra = self.extra.clone();
        extra.sort_unstable();
        buf.push_str(&extra.join("\u{2}"));
        buf.into_bytes()
    }

    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = Sha256::digest(self.canonical_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }
}

/// A SHA-256 digest of a [`DispatchKey`]'s canonical byte string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(#[serde(with = "hex_bytes")] [u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// A cheap, well-distributed 64-bit projection used by the ring client
    /// to place virtual nodes without re-hashing.
    #[must_use]
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0[0..8].try_into().expect("8 bytes"))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", hex::encode(self.0))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

mod hex_bytes {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        use serde::Deserialize;
        let s = String::deserialize(deserializer)?;
        let decoded = hex::decode(&s).map_err(serde::de::Error::custom)?;
        decoded
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(resource_ids: Vec<&str>) -> DispatchKey {
        DispatchKey {
            kind: DispatchKind::Check,
            at_revision: "42".into(),
            resource_relation: RelationReference::new("document", "view"),
            resource_ids: resource_ids.into_iter().map(String::from).collect(),
            subject_namespace: "user".into(),
            subject_object_id: "alice".into(),
            subject_relation: None,
            extra: Vec::new(),
        }
    }

    #[test]
    fn fingerprint_is_order_insensitive_over_resource_ids() {
        let a = key(vec!["doc1", "doc2"]).fingerprint();
        let b = key(vec!["doc2", "doc1"]).fingerprint();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = key(vec!["doc1"]).fingerprint();
        let b = key(vec!["doc1"]).fingerprint();
        assert_eq!(a, b);
    }

    #[test]
    fn different_kinds_produce_different_fingerprints() {
        let mut expand_key = key(vec!["doc1"]);
        expand_key.kind = DispatchKind::Expand;
        assert_ne!(key(vec!["doc1"]).fingerprint(), expand_key.fingerprint());
    }
}
