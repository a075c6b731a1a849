//! Exercises the real axum server against the real reqwest client: a
//! `Check` request is serialized, sent over loopback HTTP, evaluated by a
//! single-node dispatcher, and the response deserialized back.

use std::collections::BTreeMap;
use std::sync::Arc;

use rebac_cache::CacheConfig;
use rebac_dispatch::{Dispatcher, PeerTransport};
use rebac_engine::types::CheckRequest;
use rebac_engine::InMemorySchemaIndex;
use rebac_model::{CompiledNamespace, CompiledRewrite, DebugSetting, ObjectRef, ResolverMeta};
use rebac_ring::{HashRing, PeerDescriptor};
use rebac_rpc::ReqwestPeerTransport;
use rebac_storage::InMemoryRevisionReader;

struct UnreachablePeers;

#[async_trait::async_trait]
impl PeerTransport for UnreachablePeers {
    async fn check(
        &self,
        _peer: &PeerDescriptor,
        _request: rebac_engine::types::CheckRequest,
    ) -> rebac_dispatch::Result<rebac_engine::types::CheckResponse> {
        panic!("test server is single-node; no sub-routing expected")
    }
    async fn expand(
        &self,
        _peer: &PeerDescriptor,
        _request: rebac_engine::types::ExpandRequest,
    ) -> rebac_dispatch::Result<rebac_engine::types::ExpandResponse> {
        unimplemented!()
    }
    async fn reachable_resources(
        &self,
        _peer: &PeerDescriptor,
        _request: rebac_engine::types::ReachableResourcesRequest,
    ) -> rebac_dispatch::Result<rebac_engine::types::ReachableResourcesResponse> {
        unimplemented!()
    }
    async fn lookup_resources(
        &self,
        _peer: &PeerDescriptor,
        _request: rebac_engine::types::LookupResourcesRequest,
    ) -> rebac_dispatch::Result<rebac_engine::types::LookupResourcesResponse> {
        unimplemented!()
    }
    async fn lookup_subjects(
        &self,
        _peer: &PeerDescriptor,
        _request: rebac_engine::types::LookupSubjectsRequest,
    ) -> rebac_dispatch::Result<rebac_engine::types::LookupSubjectsResponse> {
        unimplemented!()
    }
}

#[tokio::test]
async fn check_round_trips_over_http() {
    let storage = InMemoryRevisionReader::new();
    storage.write_at(
        1,
        vec![rebac_model::RelationTuple {
            namespace: "document".into(),
            object_id: "doc1".into(),
            relation: "viewer".into(),
            subject_namespace: "user".into(),
            subject_object_id: "alice".into(),
            subject_relation: None,
            caveat_name: None,
            caveat_context: BTreeMap::new(),
        }],
    );

    let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
        namespace: "document".into(),
        relations: [("viewer".to_string(), CompiledRewrite::This)].into(),
        caveats: BTreeMap::new(),
    });

    let ring = HashRing::new(100, 1.25, Some("node-a".into()));
    ring.update_peers(vec![PeerDescriptor::new("node-a", "unused:0")]);

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(schema),
        Arc::new(storage),
        Arc::new(ring),
        Arc::new(UnreachablePeers),
        CacheConfig::default(),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = rebac_rpc::router(dispatcher);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let transport = ReqwestPeerTransport::new(reqwest::Client::new());
    let peer = PeerDescriptor::new("node-a", addr.to_string());

    let response = transport
        .check(
            &peer,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "viewer".into(),
                subject: ObjectRef::new("user", "alice"),
                subject_relation: None,
                context: BTreeMap::new(),
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap();

    assert!(response.result.is_member());
    assert_eq!(response.meta.dispatch_count, 1);
}

#[tokio::test]
async fn unknown_relation_maps_to_invalid_argument_over_http() {
    let storage = InMemoryRevisionReader::new();
    let schema = InMemorySchemaIndex::new().with_namespace(CompiledNamespace {
        namespace: "document".into(),
        relations: BTreeMap::new(),
        caveats: BTreeMap::new(),
    });

    let ring = HashRing::new(100, 1.25, Some("node-a".into()));
    ring.update_peers(vec![PeerDescriptor::new("node-a", "unused:0")]);

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::new(schema),
        Arc::new(storage),
        Arc::new(ring),
        Arc::new(UnreachablePeers),
        CacheConfig::default(),
    ));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = rebac_rpc::router(dispatcher);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let transport = ReqwestPeerTransport::new(reqwest::Client::new());
    let peer = PeerDescriptor::new("node-a", addr.to_string());

    let err = transport
        .check(
            &peer,
            CheckRequest {
                resource: ObjectRef::new("document", "doc1"),
                relation: "viewer".into(),
                subject: ObjectRef::new("user", "alice"),
                subject_relation: None,
                context: BTreeMap::new(),
                meta: ResolverMeta::new("1", 50),
                debug: DebugSetting::NoDebug,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, rebac_dispatch::DispatchError::PeerUnavailable(_)));
}
