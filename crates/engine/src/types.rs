//! Request/response shapes for the five dispatch calls.
//! These are the types `rebac-dispatch` (C4) passes down into this crate's
//! resolvers and the types the injected [`crate::dispatch_trait::Dispatch`]
//! trait returns for recursive sub-calls.

use std::collections::BTreeMap;

use rebac_model::{
    DebugSetting, DebugTraceNode, ExpandDepth, FoundSubjectSet, ObjectRef, ReachableResource,
    RelationTupleTreeNode, ResolvedResource, ResolverMeta, ResourceCheckResult, ResponseMeta,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub resource: ObjectRef,
    pub relation: String,
    pub subject: ObjectRef,
    pub subject_relation: Option<String>,
    pub context: BTreeMap<String, Value>,
    pub meta: ResolverMeta,
    pub debug: DebugSetting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResponse {
    pub result: ResourceCheckResult,
    pub meta: ResponseMeta,
    pub debug_trace: Option<DebugTraceNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandRequest {
    pub resource: ObjectRef,
    pub relation: String,
    pub depth: ExpandDepth,
    pub meta: ResolverMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpandResponse {
    pub tree: RelationTupleTreeNode,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachableResourcesRequest {
    pub resource_namespace: String,
    pub resource_relation: String,
    pub subject: ObjectRef,
    pub subject_relation: Option<String>,
    pub context: BTreeMap<String, Value>,
    pub meta: ResolverMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReachableResourcesResponse {
    pub resources: Vec<ReachableResource>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResourcesRequest {
    pub resource_namespace: String,
    pub resource_relation: String,
    pub subject: ObjectRef,
    pub subject_relation: Option<String>,
    pub context: BTreeMap<String, Value>,
    pub candidate_resource_ids: Vec<String>,
    pub meta: ResolverMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResourcesResponse {
    pub resources: Vec<ResolvedResource>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSubjectsRequest {
    pub resource: ObjectRef,
    pub relation: String,
    pub subject_namespace: String,
    pub context: BTreeMap<String, Value>,
    pub meta: ResolverMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSubjectsResponse {
    pub subjects: FoundSubjectSet,
    pub meta: ResponseMeta,
}
