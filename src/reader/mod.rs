use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RollupError;
use crate::hierarchy::AncestorChain;
use crate::types::{GeoScope, ReportingPeriod};

pub mod memory;
pub mod postgres;

pub use memory::MemoryReader;
pub use postgres::PgObservationReader;

/// One raw fact as submitted by a facilitator, pre-joined with the school's
/// full ancestor chain. Immutable once submitted; a re-submission creates a
/// new row that supersedes the prior one for the same (school, item, period),
/// and readers always return the latest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: Uuid,
    pub school_id: i64,
    pub school_name: String,
    pub chain: AncestorChain,
    pub item_name: String,
    pub raw_status: Option<String>,
    pub period: ReportingPeriod,
    pub submitted_at: DateTime<Utc>,
}

impl Observation {
    /// Whether this observation falls inside the given scope
    pub fn in_scope(&self, scope: &GeoScope) -> bool {
        match scope {
            GeoScope::Nation => true,
            GeoScope::Region(id) => self.chain.region_id == *id,
            GeoScope::District(id) => self.chain.district_id == *id,
            GeoScope::Circuit(id) => self.chain.circuit_id == *id,
            GeoScope::School(id) => self.school_id == *id,
        }
    }

    /// Whether this observation belongs to the given reporting period.
    /// A period without a week matches any week (term-level view).
    pub fn in_period(&self, period: &ReportingPeriod) -> bool {
        if self.period.year != period.year || self.period.term != period.term {
            return false;
        }
        match period.week {
            Some(week) => self.period.week == Some(week),
            None => true,
        }
    }
}

/// A finite, one-pass sequence of observations. One pass suffices for the
/// aggregator; callers must not assume the stream can be restarted.
pub type ObservationStream<'a> = BoxStream<'a, Result<Observation, RollupError>>;

/// Source of raw per-school observations for a scope and period.
///
/// Implementations own the latest-wins contract: at most one observation per
/// (school, item) reaches the caller, the most recently submitted one. The
/// aggregator fails loudly if that contract is broken.
#[async_trait]
pub trait ObservationReader: Send + Sync {
    async fn fetch(
        &self,
        scope: &GeoScope,
        period: &ReportingPeriod,
    ) -> Result<ObservationStream<'_>, RollupError>;
}

#[async_trait]
impl<R: ObservationReader + ?Sized> ObservationReader for std::sync::Arc<R> {
    async fn fetch(
        &self,
        scope: &GeoScope,
        period: &ReportingPeriod,
    ) -> Result<ObservationStream<'_>, RollupError> {
        (**self).fetch(scope, period).await
    }
}
