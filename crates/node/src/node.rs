//! Wires one process's schema index, storage reader, ring, cache, and RPC
//! transport into a single [`Dispatcher`] and hands back the router the
//! process should serve. A library entry point only: the public gRPC
//! surface a real deployment sits behind is out of this crate's scope,
//! so there is no bin here.

use std::sync::Arc;

use rebac_cache::CacheConfig;
use rebac_dispatch::Dispatcher;
use rebac_engine::SchemaIndex;
use rebac_ring::{HashRing, PeerDescriptor, PeerSetSource};
use rebac_rpc::ReqwestPeerTransport;
use rebac_storage::RevisionReader;

use crate::config::NodeConfig;

/// One running dispatch node: the dispatcher plus the pieces a caller needs
/// to serve it (over `rebac_rpc::router`) and keep its ring membership
/// current.
pub struct DispatchNode {
    pub dispatcher: Arc<Dispatcher>,
    pub ring: Arc<HashRing>,
    pub config: NodeConfig,
}

impl DispatchNode {
    /// Builds a node around an already-compiled schema and a storage
    /// reader, with cluster membership supplied by `peer_source` at
    /// construction time. Peer membership is polled through
    /// `refresh_peers`, not watched automatically — this crate does not
    /// itself discover topology changes (same boundary `rebac_ring`
    /// documents).
    #[must_use]
    pub fn new(
        config: NodeConfig,
        schema: Arc<dyn SchemaIndex>,
        storage: Arc<dyn RevisionReader>,
        peer_source: &dyn PeerSetSource,
    ) -> Self {
        let ring = Arc::new(HashRing::new(
            config.virtual_nodes_per_peer,
            config.ring_load_factor,
            config.peer_id.clone(),
        ));
        ring.update_peers(peer_source.current_peers());

        let transport = Arc::new(ReqwestPeerTransport::new(reqwest::Client::new()));
        let cache_config = CacheConfig {
            max_cost_bytes: config.cache_max_cost_bytes,
            ttl: config.cache_ttl,
        };
        let dispatcher = Arc::new(Dispatcher::new(schema, storage, ring.clone(), transport, cache_config));

        Self { dispatcher, ring, config }
    }

    /// Rebuilds ring membership from `peer_source`'s current view. Call
    /// this whenever the surrounding deployment's membership watch fires;
    /// in-flight dispatches keep routing against the snapshot they already
    /// observed.
    pub fn refresh_peers(&self, peer_source: &dyn PeerSetSource) {
        self.ring.update_peers(peer_source.current_peers());
    }

    #[must_use]
    pub fn local_peer(&self) -> Option<PeerDescriptor> {
        self.config
            .peer_id
            .as_ref()
            .map(|id| PeerDescriptor::new(id.clone(), self.config.bind_address.clone()))
    }

    /// The axum router this node should be served behind.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        rebac_rpc::router(self.dispatcher.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebac_engine::InMemorySchemaIndex;
    use rebac_ring::StaticPeerSet;
    use rebac_storage::InMemoryRevisionReader;

    #[test]
    fn a_single_node_with_itself_as_its_only_peer_builds_cleanly() {
        let mut config = NodeConfig::default();
        config.peer_id = Some("local".to_string());
        let peers = StaticPeerSet::new(vec![PeerDescriptor::new("local", &config.bind_address)]);

        let node = DispatchNode::new(
            config,
            Arc::new(InMemorySchemaIndex::default()),
            Arc::new(InMemoryRevisionReader::new()),
            &peers,
        );

        assert_eq!(node.ring.peer_count(), 1);
        assert!(node.ring.is_local(&node.local_peer().unwrap()));
    }
}
