//! Per-survey item catalogs.
//!
//! Each survey domain (sanitation, WASH, outcome indicators) is just an
//! `ItemCatalog` handed to a `RollupService`; the rollup engine itself is
//! domain-agnostic. Items missing from a catalog fall through to the
//! heuristic classifier, which is best-effort only.

use std::collections::HashMap;

use crate::classifier::{self, NormalizedStatus};
use crate::config;

/// How raw statuses for an item are normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRule {
    /// Available / Not Available / Unknown
    Binary,
    /// Multi-valued: the water source type is the label
    WaterSource,
}

/// Fixed item-name -> rule table for one survey domain
#[derive(Debug, Clone)]
pub struct ItemCatalog {
    domain: String,
    rules: HashMap<String, ItemRule>,
}

impl ItemCatalog {
    pub fn new(domain: impl Into<String>) -> Self {
        Self { domain: domain.into(), rules: HashMap::new() }
    }

    pub fn with_item(mut self, item_name: impl Into<String>, rule: ItemRule) -> Self {
        self.rules.insert(item_name.into(), rule);
        self
    }

    /// Domain tag; participates in the cache-key filter signature so survey
    /// domains never share cache entries
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn rule(&self, item_name: &str) -> Option<ItemRule> {
        self.rules.get(item_name).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Normalize one raw status. Unknown item names use the heuristic
    /// fallback (when enabled) and emit a diagnostic so catalog gaps stay
    /// visible.
    pub fn classify(&self, item_name: &str, raw_status: Option<&str>) -> NormalizedStatus {
        if let Some(rule) = self.rule(item_name) {
            return classifier::classify(rule, raw_status);
        }

        let cfg = config::config();
        if cfg.rollup.log_unknown_items {
            tracing::debug!(
                domain = %self.domain,
                item = %item_name,
                "item not in catalog; using heuristic classification"
            );
        }
        // Nothing recorded is the item default, independent of the fallback
        if classifier::is_null_like(raw_status) {
            return NormalizedStatus::NotAvailable;
        }
        if !cfg.rollup.heuristic_fallback {
            return NormalizedStatus::Unknown;
        }
        match raw_status {
            Some(raw) => classifier::heuristic_status(raw),
            None => NormalizedStatus::NotAvailable,
        }
    }

    /// School sanitation survey
    pub fn sanitation() -> Self {
        Self::new("sanitation")
            .with_item("Toilet (Seat/Cubicle)", ItemRule::Binary)
            .with_item("Urinal", ItemRule::Binary)
            .with_item("Refuse Disposal Site", ItemRule::Binary)
            .with_item("Dustbin", ItemRule::Binary)
            .with_item("Changing Rooms for Girls", ItemRule::Binary)
            .with_item("Water", ItemRule::WaterSource)
    }

    /// WASH facility survey
    pub fn wash() -> Self {
        Self::new("wash")
            .with_item("Water", ItemRule::WaterSource)
            .with_item("Hand Washing Facility", ItemRule::Binary)
            .with_item("Soap", ItemRule::Binary)
            .with_item("Veronica Bucket", ItemRule::Binary)
            .with_item("Toilet (Seat/Cubicle)", ItemRule::Binary)
    }

    /// Right-to-Play outcome indicator survey
    pub fn outcome_indicators() -> Self {
        Self::new("outcomes")
            .with_item("Play-Based Learning Adopted", ItemRule::Binary)
            .with_item("Teacher Trained in Play-Based Methods", ItemRule::Binary)
            .with_item("Safe Play Space", ItemRule::Binary)
            .with_item("Gender Responsive Environment", ItemRule::Binary)
    }
}
