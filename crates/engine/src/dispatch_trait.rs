//! The seam between the local resolvers (C3) and the distributed dispatcher
//! (C4). Resolvers call back through this trait whenever a rewrite tree asks
//! for the membership of a *different* resource/relation pair — the
//! dispatcher decides whether that sub-call runs in-process or crosses the
//! ring to another peer. This crate never talks to `rebac-ring` or
//! `rebac-cache` directly.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CheckRequest, CheckResponse, ExpandRequest, ExpandResponse, LookupResourcesRequest,
    LookupResourcesResponse, LookupSubjectsRequest, LookupSubjectsResponse,
    ReachableResourcesRequest, ReachableResourcesResponse,
};

#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn check(&self, request: CheckRequest) -> Result<CheckResponse>;
    async fn expand(&self, request: ExpandRequest) -> Result<ExpandResponse>;
    async fn reachable_resources(
        &self,
        request: ReachableResourcesRequest,
    ) -> Result<ReachableResourcesResponse>;
    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesResponse>;
    async fn lookup_subjects(
        &self,
        request: LookupSubjectsRequest,
    ) -> Result<LookupSubjectsResponse>;
}
