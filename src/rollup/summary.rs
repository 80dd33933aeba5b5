use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::facade::CacheValue;
use crate::classifier::NormalizedStatus;
use crate::types::GeoScope;

/// Aggregate for one item at one hierarchy level.
///
/// Invariant: `total` equals the sum of `status_counts` values, and a parent
/// level's summary is exactly the sum of its children's summaries for the
/// same item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub item_name: String,
    pub total: u64,
    pub status_counts: BTreeMap<String, u64>,
}

impl ItemSummary {
    pub fn new(item_name: impl Into<String>) -> Self {
        Self {
            item_name: item_name.into(),
            total: 0,
            status_counts: BTreeMap::new(),
        }
    }

    /// Count one classified observation
    pub fn record(&mut self, status: NormalizedStatus) {
        *self.status_counts.entry(status.label().to_string()).or_insert(0) += 1;
        self.total += 1;
    }

    /// Sum-by-label merge of a child summary for the same item
    pub fn merge(&mut self, other: &ItemSummary) {
        for (label, count) in &other.status_counts {
            *self.status_counts.entry(label.clone()).or_insert(0) += count;
        }
        self.total += other.total;
    }

    pub fn count(&self, label: &str) -> u64 {
        self.status_counts.get(label).copied().unwrap_or(0)
    }

    /// Headline number for display: every available-equivalent label,
    /// including the distinct water source labels
    pub fn available_total(&self) -> u64 {
        self.status_counts
            .iter()
            .filter(|(label, _)| {
                NormalizedStatus::from_label(label)
                    .map(|s| s.is_available_equivalent())
                    .unwrap_or(false)
            })
            .map(|(_, count)| count)
            .sum()
    }
}

/// Rollup result for one scope: item summaries plus, for district level and
/// above, child summaries retained for drill-down display. Computed on
/// demand and cached with a TTL; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub scope: GeoScope,
    pub name: Option<String>,
    pub items: Vec<ItemSummary>,
    pub children: Vec<LevelSummary>,
}

impl LevelSummary {
    pub fn empty(scope: GeoScope) -> Self {
        Self { scope, name: None, items: Vec::new(), children: Vec::new() }
    }

    pub fn item(&self, item_name: &str) -> Option<&ItemSummary> {
        self.items.iter().find(|i| i.item_name == item_name)
    }

    pub fn child(&self, scope: GeoScope) -> Option<&LevelSummary> {
        self.children.iter().find(|c| c.scope == scope)
    }

    /// Total observation count across all items
    pub fn observation_total(&self) -> u64 {
        self.items.iter().map(|i| i.total).sum()
    }
}

impl CacheValue for LevelSummary {
    // Empty rollups are recomputed rather than cached; a scope with no data
    // yet would otherwise pin an empty result for a full TTL
    fn is_cacheable(&self) -> bool {
        !self.items.is_empty() || !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_total_in_sync_with_counts() {
        let mut summary = ItemSummary::new("Water");
        summary.record(NormalizedStatus::PipeBorne);
        summary.record(NormalizedStatus::PipeBorne);
        summary.record(NormalizedStatus::NotAvailable);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.status_counts.values().sum::<u64>(), summary.total);
        assert_eq!(summary.count("Pipe Borne"), 2);
        assert_eq!(summary.available_total(), 2);
    }

    #[test]
    fn merge_is_a_sum_by_label() {
        let mut left = ItemSummary::new("Urinal");
        left.record(NormalizedStatus::Available);
        let mut right = ItemSummary::new("Urinal");
        right.record(NormalizedStatus::Available);
        right.record(NormalizedStatus::NotAvailable);

        left.merge(&right);
        assert_eq!(left.total, 3);
        assert_eq!(left.count("Available"), 2);
        assert_eq!(left.count("Not Available"), 1);
        assert_eq!(left.status_counts.values().sum::<u64>(), left.total);
    }

    #[test]
    fn empty_summaries_are_not_cacheable() {
        assert!(!LevelSummary::empty(GeoScope::Nation).is_cacheable());

        let mut with_items = LevelSummary::empty(GeoScope::Circuit(1));
        with_items.items.push(ItemSummary::new("Water"));
        assert!(with_items.is_cacheable());
    }
}
