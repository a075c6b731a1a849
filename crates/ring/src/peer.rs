//! Peer membership as delivered to the ring from outside this crate.

use std::fmt;

/// One addressable peer of the dispatch cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerDescriptor {
    /// Stable identity used for virtual-node placement. Must not change
    /// across restarts if you want routing to stay sticky; the advertised
    /// network address may.
    pub id: String,
    /// `host:port` the RPC client connects to.
    pub address: String,
}

impl PeerDescriptor {
    pub fn new(id: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for PeerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}

/// Supplies the ring with cluster membership. Implementations typically wrap
/// a gossip protocol, a Kubernetes endpoints watch, or (in tests) a fixed
/// list. This crate never discovers membership itself — membership
/// delivery is left external to the dispatch engine.
pub trait PeerSetSource: Send + Sync {
    fn current_peers(&self) -> Vec<PeerDescriptor>;
}

/// A [`PeerSetSource`] over a list fixed at construction, for tests and
/// single-node deployments.
pub struct StaticPeerSet(Vec<PeerDescriptor>);

impl StaticPeerSet {
    #[must_use]
    pub fn new(peers: Vec<PeerDescriptor>) -> Self {
        Self(peers)
    }
}

impl PeerSetSource for StaticPeerSet {
    fn current_peers(&self) -> Vec<PeerDescriptor> {
        self.0.clone()
    }
}
