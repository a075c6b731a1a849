//! The dispatcher (C4): depth budget, dispatch cache, and consistent-hash
//! ring routing wired around the local resolvers (C2/C3). This is the only
//! crate that implements [`rebac_engine::Dispatch`] for production use —
//! every recursive sub-call a rewrite tree makes comes back through here,
//! whether it resolves in-process or crosses to another peer over
//! [`transport::PeerTransport`].

mod cache_keys;
pub mod dispatcher;
pub mod error;
pub mod transport;

pub use dispatcher::{Caches, Dispatcher};
pub use error::{DispatchError, Result};
pub use transport::PeerTransport;
