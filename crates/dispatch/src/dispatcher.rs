//! The dispatcher (C4): the one thing in this workspace that actually knows
//! about depth budgets, the cache, and the ring all at once. Every recursive
//! hop a resolver makes through [`rebac_engine::Dispatch`] lands back here.
//!
//! A call either resolves locally (the ring says this node owns the
//! fingerprint) or crosses to whichever peer does, through
//! [`PeerTransport`]. Either way the pure result gets run through the cache
//! first, so an identical in-flight or already-answered sub-request never
//! pays for a second evaluation or a second network hop.

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rebac_cache::{CacheConfig, DispatchCache};
use rebac_engine::dispatch_trait::Dispatch;
use rebac_engine::error::Result as EngineResult;
use rebac_engine::resolvers;
use rebac_engine::schema::SchemaIndex;
use rebac_engine::types::{
    CheckRequest, CheckResponse, ExpandRequest, ExpandResponse, LookupResourcesRequest,
    LookupResourcesResponse, LookupSubjectsRequest, LookupSubjectsResponse,
    ReachableResourcesRequest, ReachableResourcesResponse,
};
use rebac_model::{
    FoundSubjectSet, Fingerprint, ReachableResource, RelationTupleTreeNode, ResolvedResource,
    ResourceCheckResult, ResponseMeta,
};
use rebac_ring::{HashRing, PeerDescriptor};
use rebac_storage::RevisionReader;
use serde::Serialize;

use crate::cache_keys;
use crate::error::{as_engine_error, DispatchError, Result};
use crate::transport::PeerTransport;

/// One [`DispatchCache`] per call kind, each monomorphic in that call's pure
/// result type. Kept separate rather than one cache keyed by an enum so each
/// can be sized and evicted independently (check traffic vastly outweighs
/// the other four in most deployments).
pub struct Caches {
    pub check: DispatchCache<ResourceCheckResult>,
    pub expand: DispatchCache<RelationTupleTreeNode>,
    pub reachable_resources: DispatchCache<Vec<ReachableResource>>,
    pub lookup_resources: DispatchCache<Vec<ResolvedResource>>,
    pub lookup_subjects: DispatchCache<FoundSubjectSet>,
}

impl Caches {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            check: DispatchCache::new(config.clone()),
            expand: DispatchCache::new(config.clone()),
            reachable_resources: DispatchCache::new(config.clone()),
            lookup_resources: DispatchCache::new(config.clone()),
            lookup_subjects: DispatchCache::new(config),
        }
    }
}

pub struct Dispatcher {
    schema: Arc<dyn SchemaIndex>,
    storage: Arc<dyn RevisionReader>,
    ring: Arc<HashRing>,
    transport: Arc<dyn PeerTransport>,
    caches: Caches,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        schema: Arc<dyn SchemaIndex>,
        storage: Arc<dyn RevisionReader>,
        ring: Arc<HashRing>,
        transport: Arc<dyn PeerTransport>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            schema,
            storage,
            ring,
            transport,
            caches: Caches::new(cache_config),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<dyn SchemaIndex> {
        &self.schema
    }

    #[must_use]
    pub fn storage(&self) -> &Arc<dyn RevisionReader> {
        &self.storage
    }

    #[must_use]
    pub fn ring(&self) -> &Arc<HashRing> {
        &self.ring
    }
}

/// Routes `fingerprint` and runs whichever of `local`/`remote` applies,
/// through `cache`. Turns the raw value the cache returns back into a
/// [`ResponseMeta`]: a cache hit always reports zero additional depth and
/// `cached_dispatch_count == dispatch_count`; a
/// miss adds one hop on top of whatever the sub-call itself required.
async fn dispatch_with_cache<V, FLocal, FutLocal, FRemote, FutRemote>(
    cache: &DispatchCache<V>,
    ring: &HashRing,
    fingerprint: Fingerprint,
    local: FLocal,
    remote: FRemote,
) -> Result<(V, ResponseMeta)>
where
    V: Clone + Serialize + Send + Sync + 'static,
    FLocal: FnOnce() -> FutLocal,
    FutLocal: Future<Output = EngineResult<(V, ResponseMeta)>>,
    FRemote: FnOnce(PeerDescriptor) -> FutRemote,
    FutRemote: Future<Output = Result<(V, ResponseMeta)>>,
{
    let guard = ring.route(&fingerprint)?;
    let is_local = ring.is_local(guard.peer());
    let peer = guard.peer().clone();

    let sub_meta: Arc<Mutex<Option<ResponseMeta>>> = Arc::new(Mutex::new(None));
    let sub_meta_for_compute = sub_meta.clone();

    let (value, cached) = cache
        .get_or_compute(fingerprint, move || async move {
            let (value, meta) = if is_local {
                local().await.map_err(DispatchError::from)?
            } else {
                remote(peer).await?
            };
            *sub_meta_for_compute.lock().expect("dispatch meta mutex poisoned") = Some(meta);
            Ok::<V, DispatchError>(value)
        })
        .await?;

    drop(guard);

    let meta = if cached {
        ResponseMeta::single_dispatch(true, 0)
    } else {
        let sub_meta = sub_meta
            .lock()
            .expect("dispatch meta mutex poisoned")
            .take()
            .unwrap_or_default();
        ResponseMeta {
            dispatch_count: sub_meta.dispatch_count + 1,
            cached_dispatch_count: sub_meta.cached_dispatch_count,
            depth_required: sub_meta.depth_required + 1,
        }
    };

    Ok((value, meta))
}

#[async_trait]
impl Dispatch for Dispatcher {
    async fn check(&self, request: CheckRequest) -> EngineResult<CheckResponse> {
        if request.meta.depth_remaining == 0 {
            return Err(as_engine_error(DispatchError::DepthExceeded));
        }
        let fingerprint = cache_keys::check_key(
            &request.resource,
            &request.relation,
            &request.subject,
            request.subject_relation.as_deref(),
            &request.context,
            &request.meta.at_revision,
        )
        .fingerprint();

        let schema = self.schema.clone();
        let storage = self.storage.clone();
        let transport = self.transport.clone();
        let local_request = request.clone();
        let remote_request = request.clone();

        let (result, meta) = dispatch_with_cache(
            &self.caches.check,
            &self.ring,
            fingerprint,
            move || async move {
                let response =
                    resolvers::check(schema.as_ref(), storage.as_ref(), self, local_request).await?;
                Ok((response.result, response.meta))
            },
            move |peer| async move {
                let response = transport.check(&peer, remote_request).await?;
                Ok((response.result, response.meta))
            },
        )
        .await
        .map_err(as_engine_error)?;

        Ok(CheckResponse {
            result,
            meta,
            debug_trace: None,
        })
    }

    async fn expand(&self, request: ExpandRequest) -> EngineResult<ExpandResponse> {
        if request.meta.depth_remaining == 0 {
            return Err(as_engine_error(DispatchError::DepthExceeded));
        }
        let fingerprint =
            cache_keys::expand_key(&request.resource, &request.relation, &request.meta.at_revision)
                .fingerprint();

        let schema = self.schema.clone();
        let storage = self.storage.clone();
        let transport = self.transport.clone();
        let local_request = request.clone();
        let remote_request = request.clone();

        let (tree, meta) = dispatch_with_cache(
            &self.caches.expand,
            &self.ring,
            fingerprint,
            move || async move {
                let response =
                    resolvers::expand(schema.as_ref(), storage.as_ref(), self, local_request).await?;
                Ok((response.tree, response.meta))
            },
            move |peer| async move {
                let response = transport.expand(&peer, remote_request).await?;
                Ok((response.tree, response.meta))
            },
        )
        .await
        .map_err(as_engine_error)?;

        Ok(ExpandResponse { tree, meta })
    }

    async fn reachable_resources(
        &self,
        request: ReachableResourcesRequest,
    ) -> EngineResult<ReachableResourcesResponse> {
        if request.meta.depth_remaining == 0 {
            return Err(as_engine_error(DispatchError::DepthExceeded));
        }
        let fingerprint = cache_keys::reachable_resources_key(
            &request.resource_namespace,
            &request.resource_relation,
            &request.subject,
            request.subject_relation.as_deref(),
            &request.context,
            &request.meta.at_revision,
        )
        .fingerprint();

        let schema = self.schema.clone();
        let storage = self.storage.clone();
        let transport = self.transport.clone();
        let local_request = request.clone();
        let remote_request = request.clone();

        let (resources, meta) = dispatch_with_cache(
            &self.caches.reachable_resources,
            &self.ring,
            fingerprint,
            move || async move {
                let response =
                    resolvers::reachable_resources(schema.as_ref(), storage.as_ref(), self, local_request)
                        .await?;
                Ok((response.resources, response.meta))
            },
            move |peer| async move {
                let response = transport.reachable_resources(&peer, remote_request).await?;
                Ok((response.resources, response.meta))
            },
        )
        .await
        .map_err(as_engine_error)?;

        Ok(ReachableResourcesResponse { resources, meta })
    }

    async fn lookup_resources(
        &self,
        request: LookupResourcesRequest,
    ) -> EngineResult<LookupResourcesResponse> {
        if request.meta.depth_remaining == 0 {
            return Err(as_engine_error(DispatchError::DepthExceeded));
        }
        let fingerprint = cache_keys::lookup_resources_key(
            &request.resource_namespace,
            &request.resource_relation,
            &request.subject,
            request.subject_relation.as_deref(),
            &request.candidate_resource_ids,
            &request.context,
            &request.meta.at_revision,
        )
        .fingerprint();

        let schema = self.schema.clone();
        let storage = self.storage.clone();
        let transport = self.transport.clone();
        let local_request = request.clone();
        let remote_request = request.clone();

        let (resources, meta) = dispatch_with_cache(
            &self.caches.lookup_resources,
            &self.ring,
            fingerprint,
            move || async move {
                let response =
                    resolvers::lookup_resources(schema.as_ref(), storage.as_ref(), self, local_request)
                        .await?;
                Ok((response.resources, response.meta))
            },
            move |peer| async move {
                let response = transport.lookup_resources(&peer, remote_request).await?;
                Ok((response.resources, response.meta))
            },
        )
        .await
        .map_err(as_engine_error)?;

        Ok(LookupResourcesResponse { resources, meta })
    }

    async fn lookup_subjects(
        &self,
        request: LookupSubjectsRequest,
    ) -> EngineResult<LookupSubjectsResponse> {
        if request.meta.depth_remaining == 0 {
            return Err(as_engine_error(DispatchError::DepthExceeded));
        }
        let fingerprint = cache_keys::lookup_subjects_key(
            &request.resource,
            &request.relation,
            &request.subject_namespace,
            &request.context,
            &request.meta.at_revision,
        )
        .fingerprint();

        let schema = self.schema.clone();
        let storage = self.storage.clone();
        let transport = self.transport.clone();
        let local_request = request.clone();
        let remote_request = request.clone();

        let (subjects, meta) = dispatch_with_cache(
            &self.caches.lookup_subjects,
            &self.ring,
            fingerprint,
            move || async move {
                let response =
                    resolvers::lookup_subjects(schema.as_ref(), storage.as_ref(), self, local_request)
                        .await?;
                Ok((response.subjects, response.meta))
            },
            move |peer| async move {
                let response = transport.lookup_subjects(&peer, remote_request).await?;
                Ok((response.subjects, response.meta))
            },
        )
        .await
        .map_err(as_engine_error)?;

        Ok(LookupSubjectsResponse { subjects, meta })
    }
}
