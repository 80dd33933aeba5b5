use std::sync::Arc;
use std::time::Duration;

use crate::cache::backend::KeyValueCache;
use crate::cache::facade::QueryCache;
use crate::cache::invalidation::{plan_invalidation, EntityMutation};
use crate::cache::key::CacheKey;
use crate::catalog::ItemCatalog;
use crate::classifier::STATUS_HINTS_REVISION;
use crate::config;
use crate::error::RollupError;
use crate::reader::ObservationReader;
use crate::rollup::aggregator::RollupBuilder;
use crate::rollup::summary::LevelSummary;
use crate::types::{GeoFilter, GeoScope, ReportingPeriod};

/// Public entry point for the reporting subsystem: cache-backed hierarchical
/// rollups plus write-path invalidation.
///
/// One service per survey domain; the catalog's domain tag keeps cache
/// entries separate. Both the reader and the cache backend are injected so
/// the process entry point owns their lifecycles.
pub struct RollupService {
    reader: Arc<dyn ObservationReader>,
    cache: QueryCache,
    catalog: ItemCatalog,
    ttl: Duration,
}

impl RollupService {
    pub fn new(
        reader: Arc<dyn ObservationReader>,
        cache_backend: Arc<dyn KeyValueCache>,
        catalog: ItemCatalog,
    ) -> Self {
        Self {
            reader,
            cache: QueryCache::new(cache_backend),
            catalog,
            ttl: Duration::from_secs(config::config().cache.default_ttl_secs),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Bypass the configured cache switch (used by tests and backfills)
    pub fn with_cache_enabled(
        reader: Arc<dyn ObservationReader>,
        cache_backend: Arc<dyn KeyValueCache>,
        catalog: ItemCatalog,
        enabled: bool,
    ) -> Self {
        Self {
            reader,
            cache: QueryCache::with_enabled(cache_backend, enabled),
            catalog,
            ttl: Duration::from_secs(config::config().cache.default_ttl_secs),
        }
    }

    /// Aggregate observations for the resolved scope and period, read-through
    /// cached. A consistent read after a write requires the write's
    /// invalidation to have completed first.
    pub async fn rollup(
        &self,
        filter: &GeoFilter,
        period: &ReportingPeriod,
    ) -> Result<LevelSummary, RollupError> {
        let scope = filter.resolve();
        let key = self.cache_key(&scope, period).render();

        self.cache
            .get_or_compute(&key, self.ttl, async {
                tracing::debug!(
                    scope = scope.entity_tag(),
                    domain = self.catalog.domain(),
                    year = period.year,
                    term = period.term,
                    "computing rollup"
                );
                let stream = self.reader.fetch(&scope, period).await?;
                let mut builder = RollupBuilder::new(&self.catalog);
                builder.consume(stream).await?;
                Ok(builder.finish(&scope))
            })
            .await
    }

    /// Evict every cache entry the mutation may have staled. Fire-and-forget
    /// with respect to cache errors: the mutation already committed, and its
    /// success must not depend on cache health.
    pub async fn on_entity_mutation(&self, mutation: &EntityMutation) {
        let patterns = plan_invalidation(mutation);
        tracing::info!(
            entity = mutation.level.as_str(),
            id = mutation.entity_id,
            change = ?mutation.change,
            patterns = patterns.len(),
            "invalidating cached rollups"
        );
        self.cache.invalidate_many(&patterns).await;
    }

    fn cache_key(&self, scope: &GeoScope, period: &ReportingPeriod) -> CacheKey {
        CacheKey::new(scope.entity_tag(), scope.entity_id())
            .with("domain", self.catalog.domain())
            .with("year", period.year)
            .with("term", period.term)
            .with_opt("week", period.week)
            .with("cv", STATUS_HINTS_REVISION)
    }
}
