//! Tracing setup for a standalone dispatch node, mirroring the
//! `tracing_subscriber::fmt().with_env_filter(...)` init every other binary
//! in this workspace uses.

/// Installs a `tracing` subscriber reading `RUST_LOG`, defaulting to `info`
/// plus debug logging for this crate's own spans. Call once at process
/// startup; a second call panics, same as `tracing_subscriber` itself.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rebac_node=debug,rebac_dispatch=debug".to_string()),
        )
        .init();
}
