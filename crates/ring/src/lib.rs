//! Consistent-hash ring client used to pick the owning peer for a dispatch
//! key (C5).

mod error;
mod peer;
mod ring;

pub use error::{Result, RingError};
pub use peer::{PeerDescriptor, PeerSetSource, StaticPeerSet};
pub use ring::{HashRing, RouteGuard};
