//! Ties `rebac-model`/`rebac-storage`/`rebac-engine`/`rebac-dispatch`/
//! `rebac-ring`/`rebac-cache`/`rebac-rpc`/`rebac-stream` together into one
//! running dispatch node. A library, not a bin: nothing here is the public
//! gRPC surface that sits in front of a real deployment.

pub mod config;
pub mod node;
pub mod telemetry;

pub use config::NodeConfig;
pub use node::DispatchNode;
pub use telemetry::init_tracing;
