use chrono::{DateTime, Utc};
use futures::StreamExt;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::RollupError;
use crate::hierarchy::AncestorChain;
use crate::reader::{Observation, ObservationReader, ObservationStream};
use crate::types::{GeoScope, ReportingPeriod};

/// Observation reader backed by the relational store.
///
/// The ancestor chain is denormalized onto `school_observations`, so one
/// query returns everything the aggregator needs; the name joins are for
/// display only. `DISTINCT ON` with a `submitted_at DESC` sort implements
/// the latest-wins contract in the database.
pub struct PgObservationReader {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct ObservationRow {
    id: Uuid,
    school_id: i64,
    school_name: String,
    circuit_id: i64,
    circuit_name: String,
    district_id: i64,
    district_name: String,
    region_id: i64,
    region_name: String,
    item_name: String,
    raw_status: Option<String>,
    year: i32,
    term: i16,
    week: Option<i16>,
    submitted_at: DateTime<Utc>,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        Observation {
            id: row.id,
            school_id: row.school_id,
            school_name: row.school_name,
            chain: AncestorChain::new(
                row.circuit_id,
                row.circuit_name,
                row.district_id,
                row.district_name,
                row.region_id,
                row.region_name,
            ),
            item_name: row.item_name,
            raw_status: row.raw_status,
            period: ReportingPeriod {
                year: row.year,
                term: row.term as u8,
                week: row.week.map(|w| w as u8),
            },
            submitted_at: row.submitted_at,
        }
    }
}

impl PgObservationReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn scope_column(scope: &GeoScope) -> Option<&'static str> {
        match scope {
            GeoScope::Nation => None,
            GeoScope::Region(_) => Some("o.region_id"),
            GeoScope::District(_) => Some("o.district_id"),
            GeoScope::Circuit(_) => Some("o.circuit_id"),
            GeoScope::School(_) => Some("o.school_id"),
        }
    }

    fn build_query(scope: &GeoScope, period: &ReportingPeriod) -> String {
        let mut sql = String::from(
            "SELECT DISTINCT ON (o.school_id, o.item_name) \
               o.id, o.school_id, s.name AS school_name, \
               o.circuit_id, c.name AS circuit_name, \
               o.district_id, d.name AS district_name, \
               o.region_id, r.name AS region_name, \
               o.item_name, o.raw_status, o.year, o.term, o.week, o.submitted_at \
             FROM school_observations o \
             JOIN schools s ON s.id = o.school_id \
             JOIN circuits c ON c.id = o.circuit_id \
             JOIN districts d ON d.id = o.district_id \
             JOIN regions r ON r.id = o.region_id \
             WHERE o.year = $1 AND o.term = $2",
        );
        let scope_param = if period.week.is_some() { 4 } else { 3 };
        if period.week.is_some() {
            sql.push_str(" AND o.week = $3");
        }
        if let Some(column) = Self::scope_column(scope) {
            sql.push_str(&format!(" AND {} = ${}", column, scope_param));
        }
        sql.push_str(" ORDER BY o.school_id, o.item_name, o.submitted_at DESC");
        sql
    }
}

#[async_trait::async_trait]
impl ObservationReader for PgObservationReader {
    async fn fetch(
        &self,
        scope: &GeoScope,
        period: &ReportingPeriod,
    ) -> Result<ObservationStream<'_>, RollupError> {
        let sql = Self::build_query(scope, period);

        let mut query = sqlx::query_as::<_, ObservationRow>(&sql)
            .bind(period.year)
            .bind(period.term as i16);
        if let Some(week) = period.week {
            query = query.bind(week as i16);
        }
        if let Some(id) = scope.entity_id() {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        tracing::debug!(
            scope = scope.entity_tag(),
            rows = rows.len(),
            year = period.year,
            term = period.term,
            "fetched observations"
        );

        Ok(futures::stream::iter(rows.into_iter().map(|row| Ok(row.into()))).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_filters_by_scope_column() {
        let period = ReportingPeriod::new(2024, 1);
        let sql = PgObservationReader::build_query(&GeoScope::District(4), &period);
        assert!(sql.contains("o.district_id = $3"));
        assert!(sql.contains("DISTINCT ON (o.school_id, o.item_name)"));
        assert!(sql.ends_with("ORDER BY o.school_id, o.item_name, o.submitted_at DESC"));
    }

    #[test]
    fn nation_scope_has_no_geo_clause() {
        let period = ReportingPeriod::new(2024, 1);
        let sql = PgObservationReader::build_query(&GeoScope::Nation, &period);
        assert!(!sql.contains("$3"));
    }

    #[test]
    fn week_filter_shifts_parameter_positions() {
        let period = ReportingPeriod::with_week(2024, 2, 6);
        let sql = PgObservationReader::build_query(&GeoScope::School(9), &period);
        assert!(sql.contains("o.week = $3"));
        assert!(sql.contains("o.school_id = $4"));
    }
}
