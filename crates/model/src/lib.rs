//! Shared data model for the distributed ReBAC dispatch engine.
//!
//! Everything here is a plain value type: tuples, compiled rewrite trees,
//! request/response metadata, per-resource results, and cursors. No crate in
//! this module talks to storage, the network, or a cache — see
//! `rebac-storage`, `rebac-rpc`, and `rebac-cache` for those.

pub mod cursor;
pub mod fingerprint;
pub mod meta;
pub mod resolvers;
pub mod result;
pub mod rewrite;
pub mod tuple;

pub use cursor::Cursor;
pub use fingerprint::{DispatchKey, DispatchKind, Fingerprint};
pub use meta::{DebugSetting, DebugTraceNode, ResolverMeta, ResponseMeta};
pub use resolvers::{
    ExpandDepth, FoundSubject, FoundSubjectSet, ReachabilityStatus, ReachableResource,
    RelationTupleTreeNode, ResolvedPermission, ResolvedResource, ResultsSetting,
};
pub use result::{CaveatExpression, Membership, ResourceCheckResult};
pub use rewrite::{CompiledNamespace, CompiledRewrite};
pub use tuple::{ObjectRef, RelationReference, RelationTuple, SELF_SUBJECT_RELATION, WILDCARD_SUBJECT_ID};
