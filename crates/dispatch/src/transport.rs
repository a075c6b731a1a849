//! The RPC seam: how the dispatcher reaches a peer this process is not.
//! `rebac-rpc` provides the real implementation (axum server, reqwest
//! client); this crate only depends on the trait so it never has to know
//! about HTTP, NDJSON, or connection pooling.

use async_trait::async_trait;
use rebac_engine::types::{
    CheckRequest, CheckResponse, ExpandRequest, ExpandResponse, LookupResourcesRequest,
    LookupResourcesResponse, LookupSubjectsRequest, LookupSubjectsResponse,
    ReachableResourcesRequest, ReachableResourcesResponse,
};
use rebac_ring::PeerDescriptor;

use crate::error::Result;

#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn check(&self, peer: &PeerDescriptor, request: CheckRequest) -> Result<CheckResponse>;
    async fn expand(&self, peer: &PeerDescriptor, request: ExpandRequest) -> Result<ExpandResponse>;
    async fn reachable_resources(
        &self,
        peer: &PeerDescriptor,
        request: ReachableResourcesRequest,
    ) -> Result<ReachableResourcesResponse>;
    async fn lookup_resources(
        &self,
        peer: &PeerDescriptor,
        request: LookupResourcesRequest,
    ) -> Result<LookupResourcesResponse>;
    async fn lookup_subjects(
        &self,
        peer: &PeerDescriptor,
        request: LookupSubjectsRequest,
    ) -> Result<LookupSubjectsResponse>;
}
