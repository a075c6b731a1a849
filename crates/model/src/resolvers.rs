//! Shapes produced by the local resolvers.

use serde::{Deserialize, Serialize};

use crate::tuple::ObjectRef;

/// Controls whether a batched evaluation may return as soon as any requested
/// resource has a definitive `MEMBER`, or must resolve every resource id
/// Batch callers always need `RequireAllResults`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultsSetting {
    AllowSingleResult,
    RequireAllResults,
}

/// Whether an `Expand` call stops at the first userset indirection or
/// recurses transitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpandDepth {
    Shallow,
    Recursive,
}

/// One node of the tree `ExpandResolver` produces, mirroring the rewrite
/// tree that was evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RelationTupleTreeNode {
    Leaf {
        subjects: Vec<ObjectRef>,
    },
    Union(Vec<RelationTupleTreeNode>),
    Intersection(Vec<RelationTupleTreeNode>),
    Exclusion {
        base: Box<RelationTupleTreeNode>,
        subtracted: Box<RelationTupleTreeNode>,
    },
    /// Recursion was cut off by depth exhaustion rather than a natural leaf.
    DepthExhausted,
}

/// Whether a reachable resource has been proven to carry the permission
/// outright, or merely might (and needs a follow-up `Check`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReachabilityStatus {
    /// Proven without crossing an intersection/exclusion node.
    HasPermission,
    RequiresCheck,
}

/// One element of the lazy, possibly-duplicate stream `ReachableResources`
/// produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReachableResource {
    pub resource_id: String,
    pub status: ReachabilityStatus,
    pub for_subject_ids: Vec<String>,
}

/// Whether `LookupResources` proved unconditional permission or only a
/// caveated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedPermission {
    HasPermission,
    ConditionallyHasPermission,
}

/// One element of the `LookupResources` stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedResource {
    pub resource_id: String,
    pub permission: ResolvedPermission,
    pub missing_required_context: Vec<String>,
}

/// One subject found by `LookupSubjects`; `subject_object_id == "*"` denotes
/// the public wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FoundSubject {
    pub subject_namespace: String,
    pub subject_object_id: String,
    pub subject_relation: Option<String>,
}

/// Per-resource result of `LookupSubjects`: the subjects that hold the
/// permission, and (from exclusion nodes) the subjects explicitly carved out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundSubjectSet {
    pub subjects: Vec<FoundSubject>,
    pub excluded_subjects: Vec<FoundSubject>,
}
