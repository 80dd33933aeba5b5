use std::collections::HashMap;

use futures::StreamExt;
use tokio::sync::RwLock;

use crate::error::RollupError;
use crate::reader::{Observation, ObservationReader, ObservationStream};
use crate::types::{GeoScope, ReportingPeriod};

/// In-memory observation reader for tests and single-node embedding.
///
/// Honors the same latest-wins contract as the Postgres reader: for each
/// (school, item, period) only the most recently submitted observation is
/// returned.
#[derive(Default)]
pub struct MemoryReader {
    observations: RwLock<Vec<Observation>>,
    /// When set, `fetch` fails with this message (simulates an unreachable store)
    fail_with: RwLock<Option<String>>,
}

impl MemoryReader {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self {
            observations: RwLock::new(observations),
            fail_with: RwLock::new(None),
        }
    }

    pub async fn push(&self, observation: Observation) {
        self.observations.write().await.push(observation);
    }

    /// Replace the whole data set (e.g. after a simulated reparent)
    pub async fn replace_all(&self, observations: Vec<Observation>) {
        *self.observations.write().await = observations;
    }

    pub async fn set_failure(&self, message: Option<String>) {
        *self.fail_with.write().await = message;
    }
}

#[async_trait::async_trait]
impl ObservationReader for MemoryReader {
    async fn fetch(
        &self,
        scope: &GeoScope,
        period: &ReportingPeriod,
    ) -> Result<ObservationStream<'_>, RollupError> {
        if let Some(message) = self.fail_with.read().await.clone() {
            return Err(RollupError::DataSource(message));
        }

        let observations = self.observations.read().await;
        // Latest submission wins per (school, item) among the rows matching
        // the query period, mirroring the Postgres reader's DISTINCT ON
        let mut latest: HashMap<(i64, &str), &Observation> = HashMap::new();
        for obs in observations.iter() {
            if !obs.in_scope(scope) || !obs.in_period(period) {
                continue;
            }
            latest
                .entry((obs.school_id, obs.item_name.as_str()))
                .and_modify(|existing| {
                    if obs.submitted_at > existing.submitted_at {
                        *existing = obs;
                    }
                })
                .or_insert(obs);
        }

        let mut rows: Vec<Observation> = latest.into_values().cloned().collect();
        rows.sort_by(|a, b| (a.school_id, &a.item_name).cmp(&(b.school_id, &b.item_name)));

        Ok(futures::stream::iter(rows.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::AncestorChain;
    use chrono::{TimeZone, Utc};
    use futures::TryStreamExt;
    use uuid::Uuid;

    fn obs(school_id: i64, item: &str, status: &str, minute: u32) -> Observation {
        Observation {
            id: Uuid::new_v4(),
            school_id,
            school_name: format!("School {}", school_id),
            chain: AncestorChain::new(1, "C1", 1, "D1", 1, "R1"),
            item_name: item.to_string(),
            raw_status: Some(status.to_string()),
            period: ReportingPeriod::new(2024, 1),
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn latest_submission_wins() -> Result<(), RollupError> {
        let reader = MemoryReader::new(vec![
            obs(1, "Water", "borehole", 0),
            obs(1, "Water", "pipe borne", 30),
        ]);

        let rows: Vec<Observation> = reader
            .fetch(&GeoScope::School(1), &ReportingPeriod::new(2024, 1))
            .await?
            .try_collect()
            .await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].raw_status.as_deref(), Some("pipe borne"));
        Ok(())
    }

    #[tokio::test]
    async fn scope_and_period_filter() -> Result<(), RollupError> {
        let reader = MemoryReader::new(vec![obs(1, "Water", "well", 0), obs(2, "Water", "well", 0)]);

        let rows: Vec<Observation> = reader
            .fetch(&GeoScope::School(2), &ReportingPeriod::new(2024, 1))
            .await?
            .try_collect()
            .await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].school_id, 2);

        let rows: Vec<Observation> = reader
            .fetch(&GeoScope::Nation, &ReportingPeriod::new(2023, 1))
            .await?
            .try_collect()
            .await?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn injected_failure_propagates_as_data_source_error() {
        let reader = MemoryReader::default();
        reader.set_failure(Some("store offline".into())).await;

        let err = reader
            .fetch(&GeoScope::Nation, &ReportingPeriod::new(2024, 1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RollupError::DataSource(_)));
    }
}
