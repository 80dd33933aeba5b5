use thiserror::Error;

/// Errors surfaced by the read path. Cache-layer failures are intentionally
/// absent: the cache degrades to compute-fresh reads and no-op invalidation
/// (see `cache::facade`), so callers never see them.
#[derive(Debug, Error)]
pub enum RollupError {
    /// Underlying observation store unreachable or the query failed.
    /// Propagated unchanged; the read path never falls back to stale cache
    /// beyond normal cache-miss behavior.
    #[error("data source unavailable: {0}")]
    DataSource(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// Two raw observation rows for the same (school, item, period). The
    /// reader's latest-wins contract should have deduplicated; summing here
    /// would double count every ancestor level, so this is always fatal to
    /// the rollup computation.
    #[error("duplicate observation for school {school_id}, item '{item_name}' in {year} term {term}")]
    DuplicateObservation {
        school_id: i64,
        item_name: String,
        year: i32,
        term: u8,
    },
}
