//! HTTP transport between dispatch nodes: the peer RPC surface.
//! [`server::router`] exposes a node's [`rebac_dispatch::Dispatcher`] over
//! axum; [`client::ReqwestPeerTransport`] is the matching
//! [`rebac_dispatch::PeerTransport`] implementation a dispatcher uses to
//! reach any peer the ring routes a fingerprint to.

pub mod client;
pub mod error;
pub mod server;

pub use client::ReqwestPeerTransport;
pub use error::{status_and_code, RpcError};
pub use server::{router, AppState};
