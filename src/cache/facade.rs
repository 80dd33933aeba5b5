use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::backend::KeyValueCache;
use crate::config;
use crate::error::RollupError;

/// Implemented by anything stored through the facade. Values reporting
/// themselves non-cacheable (e.g. empty rollups) are returned but never
/// stored.
pub trait CacheValue {
    fn is_cacheable(&self) -> bool {
        true
    }
}

impl CacheValue for String {
    fn is_cacheable(&self) -> bool {
        !self.is_empty()
    }
}

impl<T: CacheValue> CacheValue for Vec<T> {
    fn is_cacheable(&self) -> bool {
        !self.is_empty()
    }
}

/// Read-through cache facade. Owns every read and write of the cache store:
/// aggregation code never touches the backend directly, so the key scheme
/// stays centrally enforced.
///
/// Backend failures never escape: a failed read computes fresh, a failed
/// write or invalidation logs and moves on. The write path must never block
/// on cache health.
pub struct QueryCache {
    backend: Arc<dyn KeyValueCache>,
    enabled: bool,
}

impl QueryCache {
    /// `enabled` comes from configuration; the backend is injected by the
    /// process entry point, which owns its lifecycle
    pub fn new(backend: Arc<dyn KeyValueCache>) -> Self {
        Self { backend, enabled: config::config().cache.enabled }
    }

    pub fn with_enabled(backend: Arc<dyn KeyValueCache>, enabled: bool) -> Self {
        Self { backend, enabled }
    }

    /// On hit, return the stored value unchanged. On miss, run `compute`
    /// exactly once and store its result for `ttl`. Futures are lazy, so
    /// `compute` does no work on a hit.
    ///
    /// No single-flight guard: concurrent misses for the same key may each
    /// run `compute`. That is duplicate work, not duplicate results, since
    /// the computation is pure over the data snapshot. The store happens
    /// after `compute` completes in the same task, so cancellation leaves
    /// the cache unwritten rather than partially written.
    pub async fn get_or_compute<T, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: Fut,
    ) -> Result<T, RollupError>
    where
        T: Serialize + DeserializeOwned + CacheValue,
        Fut: Future<Output = Result<T, RollupError>>,
    {
        if self.enabled {
            match self.backend.get(key).await {
                Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                    Ok(value) => {
                        tracing::trace!(key, "cache hit");
                        return Ok(value);
                    }
                    Err(e) => {
                        tracing::warn!(key, error = %e, "corrupt cache entry, recomputing");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(key, error = %e, "cache read failed, computing without cache");
                }
            }
        }

        let value = compute.await?;

        if self.enabled && value.is_cacheable() {
            match serde_json::to_string(&value) {
                Ok(raw) => {
                    if let Err(e) = self.backend.set(key, &raw, ttl).await {
                        tracing::warn!(key, error = %e, "cache write failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "cache value serialization failed");
                }
            }
        }

        Ok(value)
    }

    /// Delete a concrete key, or everything matching a `*` pattern.
    /// Backend failures are logged, not returned: stale-but-bounded reads
    /// (up to the TTL) are the accepted degradation.
    pub async fn invalidate(&self, pattern: &str) {
        if !self.enabled {
            return;
        }

        let result = if pattern.contains('*') {
            match self.backend.keys(pattern).await {
                Ok(keys) if keys.is_empty() => Ok(0),
                Ok(keys) => self.backend.del(&keys).await,
                Err(e) => Err(e),
            }
        } else {
            let key = [pattern.to_string()];
            self.backend.del(&key).await
        };

        match result {
            Ok(removed) => {
                tracing::debug!(pattern, removed, "cache invalidated");
            }
            Err(e) => {
                tracing::warn!(pattern, error = %e, "cache invalidation failed, relying on TTL");
            }
        }
    }

    /// Apply `invalidate` to each pattern, continuing past failures
    pub async fn invalidate_many(&self, patterns: &[String]) {
        for pattern in patterns {
            self.invalidate(pattern).await;
        }
    }
}
