//! Fingerprint → result memoization with single-flight coalescing.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::future::Cache as MokaCache;
use rebac_model::Fingerprint;
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::{CacheError, Result};

/// Configuration for a [`DispatchCache`], mirroring the `dispatch.cache.*`
/// runtime knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Approximate total cost (bytes) the cache may hold before evicting.
    pub max_cost_bytes: u64,
    /// Optional time-to-live per entry, independent of revision scoping.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cost_bytes: 64 * 1024 * 1024,
            ttl: None,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_cost_bytes: std::env::var("DISPATCH_CACHE_MAX_COST_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_cost_bytes),
            ttl: std::env::var("DISPATCH_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .or(default.ttl),
        }
    }
}

/// Cost-bounded, revision-scoped memoization of dispatch responses.
///
/// Because the fingerprint embeds `at_revision` (see `rebac_model::fingerprint`),
/// older-revision entries age out naturally as new revisions mint new keys —
/// writes to the store never need to invalidate this cache.
pub struct DispatchCache<V> {
    store: MokaCache<Fingerprint, V>,
    /// In-flight computations, so concurrent lookups for the same key
    /// subscribe to the same future rather than each issuing their own
    /// sub-dispatch.
    inflight: DashMap<Fingerprint, Arc<OnceCell<V>>>,
}

impl<V> DispatchCache<V>
where
    V: Clone + Serialize + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let mut builder = MokaCache::builder()
            .max_capacity(config.max_cost_bytes)
            .weigher(|_key: &Fingerprint, value: &V| -> u32 {
                serde_json::to_vec(value)
                    .map(|bytes| bytes.len().min(u32::MAX as usize) as u32)
                    .unwrap_or(1)
            });
        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            store: builder.build(),
            inflight: DashMap::new(),
        }
    }

    /// Returns the cached value for `fingerprint` if present, without
    /// triggering computation.
    pub async fn peek(&self, fingerprint: &Fingerprint) -> Option<V> {
        self.store.get(fingerprint).await
    }

    /// Returns `(value, was_cache_hit)`, computing and caching the value on
    /// miss. Concurrent callers for the same fingerprint share one
    /// computation (single-flight coalescing).
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        fingerprint: Fingerprint,
        compute: F,
    ) -> Result<(V, bool)>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<V, E>>,
        E: std::fmt::Display,
    {
        if let Some(value) = self.store.get(&fingerprint).await {
            return Ok((value, true));
        }

        let cell = self
            .inflight
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let value = cell
            .get_or_try_init(compute)
            .await
            .map_err(|err| CacheError::ComputeFailed(err.to_string()))?
            .clone();

        // Populate the bounded cache before releasing the in-flight slot, so
        // any caller that arrives between these two lines still observes a
        // cache hit rather than racing a second computation.
        self.store.insert(fingerprint, value.clone()).await;
        self.inflight.remove(&fingerprint);

        Ok((value, false))
    }

    pub async fn invalidate(&self, fingerprint: &Fingerprint) {
        self.store.invalidate(fingerprint).await;
    }

    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.store.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rebac_model::{DispatchKey, DispatchKind, RelationReference};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct Payload(u32);

    fn fp(revision: &str) -> Fingerprint {
        DispatchKey {
            kind: DispatchKind::Check,
            at_revision: revision.into(),
            resource_relation: RelationReference::new("document", "view"),
            resource_ids: vec!["doc1".into()],
            subject_namespace: "user".into(),
            subject_object_id: "alice".into(),
            subject_relation: None,
            extra: Vec::new(),
        }
        .fingerprint()
    }

    #[tokio::test]
    async fn second_lookup_is_a_cache_hit() {
        let cache: DispatchCache<Payload> = DispatchCache::new(CacheConfig::default());
        let key = fp("1");

        let (value, hit) = cache
            .get_or_compute(key, || async { Ok::<_, String>(Payload(7)) })
            .await
            .unwrap();
        assert_eq!(value, Payload(7));
        assert!(!hit);

        let (value, hit) = cache
            .get_or_compute(key, || async { Ok::<_, String>(Payload(999)) })
            .await
            .unwrap();
        assert_eq!(value, Payload(7), "second lookup must return the cached value");
        assert!(hit);
    }

    #[tokio::test]
    async fn concurrent_lookups_coalesce_into_one_computation() {
        let cache = Arc::new(DispatchCache::<Payload>::new(CacheConfig::default()));
        let key = fp("1");
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(key, || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok::<_, String>(Payload(42))
                        }
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            let (value, _) = handle.await.unwrap();
            assert_eq!(value, Payload(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn different_revisions_do_not_collide() {
        let cache: DispatchCache<Payload> = DispatchCache::new(CacheConfig::default());
        cache
            .get_or_compute(fp("1"), || async { Ok::<_, String>(Payload(1)) })
            .await
            .unwrap();
        let (value, hit) = cache
            .get_or_compute(fp("2"), || async { Ok::<_, String>(Payload(2)) })
            .await
            .unwrap();
        assert_eq!(value, Payload(2));
        assert!(!hit);
    }
}
