//! Cost-bounded dispatch cache with single-flight coalescing (C6).
//!
//! This crate knows nothing about rewrite trees or peers; it is a generic
//! `Fingerprint -> V` memoizer that `rebac-dispatch` plugs the response types
//! of each of the five dispatch calls into.

mod dispatch_cache;
mod error;

pub use dispatch_cache::{CacheConfig, DispatchCache};
pub use error::{CacheError, Result};
