//! Runtime knobs for one dispatch node, loaded from the environment the
//! same way `rebac_cache::CacheConfig` is.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Starting `depth_remaining` budget for a dispatch entering this node
    /// from the outside.
    pub max_depth: u32,
    /// Upper bound on concurrent sub-dispatches a single call may hold open
    /// at once via `rebac_stream::InFlightWindow`.
    pub concurrency_limit: usize,
    pub cache_max_cost_bytes: u64,
    pub cache_ttl: Option<Duration>,
    pub virtual_nodes_per_peer: usize,
    pub ring_load_factor: f64,
    pub stream_window: usize,
    /// This node's own identity on the ring, and the address peers dial to
    /// reach it. `None` until the node is told who it is by its caller.
    pub peer_id: Option<String>,
    pub bind_address: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_depth: 50,
            concurrency_limit: 50,
            cache_max_cost_bytes: 64 * 1024 * 1024,
            cache_ttl: None,
            virtual_nodes_per_peer: 100,
            ring_load_factor: 1.25,
            stream_window: 128,
            peer_id: None,
            bind_address: "0.0.0.0:7000".to_string(),
        }
    }
}

impl NodeConfig {
    /// Loads a `.env` file if present, then reads environment variables.
    /// Safe to call from a binary that embeds this crate even if no `.env`
    /// file exists.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let default = Self::default();
        Self {
            max_depth: std::env::var("DISPATCH_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_depth),
            concurrency_limit: std::env::var("DISPATCH_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.concurrency_limit),
            cache_max_cost_bytes: std::env::var("DISPATCH_CACHE_MAX_COST_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.cache_max_cost_bytes),
            cache_ttl: std::env::var("DISPATCH_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .or(default.cache_ttl),
            virtual_nodes_per_peer: std::env::var("DISPATCH_RING_VIRTUAL_NODES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.virtual_nodes_per_peer),
            ring_load_factor: std::env::var("DISPATCH_RING_LOAD_FACTOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.ring_load_factor),
            stream_window: std::env::var("DISPATCH_STREAM_WINDOW")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.stream_window),
            peer_id: std::env::var("DISPATCH_PEER_ID").ok().or(default.peer_id),
            bind_address: std::env::var("DISPATCH_BIND_ADDRESS").unwrap_or(default.bind_address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_budget() {
        let config = NodeConfig::default();
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.concurrency_limit, 50);
        assert_eq!(config.virtual_nodes_per_peer, 100);
        assert_eq!(config.stream_window, 128);
    }
}
