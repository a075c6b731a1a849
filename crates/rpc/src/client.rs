//! Reqwest-backed [`PeerTransport`]: the dispatcher's only way to reach a
//! fingerprint the ring routed to a peer other than itself.

use async_trait::async_trait;
use rebac_dispatch::{DispatchError, PeerTransport};
use rebac_engine::types::{
    CheckRequest, CheckResponse, ExpandRequest, ExpandResponse, LookupResourcesRequest,
    LookupResourcesResponse, LookupSubjectsRequest, LookupSubjectsResponse,
    ReachableResourcesRequest, ReachableResourcesResponse,
};
use rebac_ring::PeerDescriptor;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::RpcError;

pub struct ReqwestPeerTransport {
    client: reqwest::Client,
}

impl ReqwestPeerTransport {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn post<Req, Resp>(&self, peer: &PeerDescriptor, path: &str, request: &Req) -> Result<Resp, DispatchError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("http://{}{path}", peer.address);
        let response = self.client.post(url).json(request).send().await.map_err(RpcError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(RpcError::Remote { status, message }.into());
        }

        let body = response.json::<Resp>().await.map_err(RpcError::from)?;
        Ok(body)
    }
}

#[async_trait]
impl PeerTransport for ReqwestPeerTransport {
    async fn check(&self, peer: &PeerDescriptor, request: CheckRequest) -> rebac_dispatch::Result<CheckResponse> {
        self.post(peer, "/dispatch/check", &request).await
    }

    async fn expand(&self, peer: &PeerDescriptor, request: ExpandRequest) -> rebac_dispatch::Result<ExpandResponse> {
        self.post(peer, "/dispatch/expand", &request).await
    }

    async fn reachable_resources(
        &self,
        peer: &PeerDescriptor,
        request: ReachableResourcesRequest,
    ) -> rebac_dispatch::Result<ReachableResourcesResponse> {
        self.post(peer, "/dispatch/reachable_resources", &request).await
    }

    async fn lookup_resources(
        &self,
        peer: &PeerDescriptor,
        request: LookupResourcesRequest,
    ) -> rebac_dispatch::Result<LookupResourcesResponse> {
        self.post(peer, "/dispatch/lookup_resources", &request).await
    }

    async fn lookup_subjects(
        &self,
        peer: &PeerDescriptor,
        request: LookupSubjectsRequest,
    ) -> rebac_dispatch::Result<LookupSubjectsResponse> {
        self.post(peer, "/dispatch/lookup_subjects", &request).await
    }
}
