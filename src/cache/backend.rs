use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a cache backend. Never propagated past the facade: reads
/// degrade to compute-fresh, invalidation degrades to a logged no-op.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

/// Minimal key-value operations the facade and planner require.
/// Pattern matching is shell-glob style; only `*` is used by this crate.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Delete the given keys, returning how many existed
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// Resolve a glob pattern to the concrete keys currently stored
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
}
