use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub rollup: RollupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Read-through caching on/off. When off the facade computes fresh on
    /// every call and invalidation is a no-op.
    pub enabled: bool,
    /// Default TTL for cached rollups. Entries are also evicted eagerly on
    /// relevant writes, so this is an upper bound on staleness.
    pub default_ttl_secs: u64,
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollupConfig {
    /// Substring-matching fallback for item types missing from the catalog.
    /// Low precision; disable to classify unmodeled items as Unknown.
    pub heuristic_fallback: bool,
    pub log_unknown_items: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::defaults().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CACHE_ENABLED") {
            self.cache.enabled = v.parse().unwrap_or(self.cache.enabled);
        }
        if let Ok(v) = env::var("CACHE_DEFAULT_TTL_SECS") {
            self.cache.default_ttl_secs = v.parse().unwrap_or(self.cache.default_ttl_secs);
        }
        if let Ok(v) = env::var("REDIS_URL") {
            self.cache.redis_url = Some(v);
        }
        if let Ok(v) = env::var("ROLLUP_HEURISTIC_FALLBACK") {
            self.rollup.heuristic_fallback = v.parse().unwrap_or(self.rollup.heuristic_fallback);
        }
        if let Ok(v) = env::var("ROLLUP_LOG_UNKNOWN_ITEMS") {
            self.rollup.log_unknown_items = v.parse().unwrap_or(self.rollup.log_unknown_items);
        }
        self
    }

    fn defaults() -> Self {
        Self {
            cache: CacheConfig {
                enabled: true,
                default_ttl_secs: 6 * 60 * 60, // 6 hours
                redis_url: None,
            },
            rollup: RollupConfig {
                heuristic_fallback: true,
                log_unknown_items: true,
            },
        }
    }
}

// Global singleton config - initialized once at startup. The cache client
// itself is injected into the facade by the process entry point, never held
// here.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_caches_for_six_hours() {
        let config = AppConfig::defaults();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.default_ttl_secs, 21_600);
        assert!(config.rollup.heuristic_fallback);
    }
}
