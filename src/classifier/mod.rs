//! Raw status normalization.
//!
//! Facilitators submit item statuses as free text (sometimes booleans or
//! counts rendered to text), and the catalogs only model the items we know
//! about. Everything funnels through one classifier so the substring
//! heuristic exists exactly once in the codebase.

use crate::catalog::ItemRule;

/// Revision of the hint lists below. Participates in every cache-key filter
/// signature, so editing the lists orphans entries classified under the old
/// rules instead of serving them until TTL expiry.
pub const STATUS_HINTS_REVISION: u32 = 3;

/// Substrings treated as available-equivalent by the heuristic fallback.
/// Checked after `UNAVAILABLE_HINTS`; several negative hints contain
/// positive ones ("not available", "unsafe", "incomplete").
pub const AVAILABLE_HINTS: &[&str] = &[
    "good",
    "excellent",
    "adequate",
    "functional",
    "available",
    "yes",
    "clean",
    "safe",
    "maintained",
    "updated",
    "current",
    "complete",
];

/// Substrings treated as not-available-equivalent by the heuristic fallback
pub const UNAVAILABLE_HINTS: &[&str] = &[
    "not available",
    "unavailable",
    "non-functional",
    "not functional",
    "broken",
    "bad",
    "poor",
    "inadequate",
    "damaged",
    "missing",
    "dirty",
    "unsafe",
    "incomplete",
    "outdated",
    "faulty",
];

/// Normalized availability verdict for one (item, raw status) pair.
/// The four water source labels are all available-equivalent for rollup
/// purposes but keep their distinct label for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizedStatus {
    Available,
    NotAvailable,
    Unknown,
    PipeBorne,
    BoreHole,
    Well,
    Stream,
}

impl NormalizedStatus {
    /// Stable label used as the status-count map key and in cache values
    pub fn label(&self) -> &'static str {
        match self {
            NormalizedStatus::Available => "Available",
            NormalizedStatus::NotAvailable => "Not Available",
            NormalizedStatus::Unknown => "Unknown",
            NormalizedStatus::PipeBorne => "Pipe Borne",
            NormalizedStatus::BoreHole => "Bore Hole",
            NormalizedStatus::Well => "Well",
            NormalizedStatus::Stream => "Stream",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Available" => Some(NormalizedStatus::Available),
            "Not Available" => Some(NormalizedStatus::NotAvailable),
            "Unknown" => Some(NormalizedStatus::Unknown),
            "Pipe Borne" => Some(NormalizedStatus::PipeBorne),
            "Bore Hole" => Some(NormalizedStatus::BoreHole),
            "Well" => Some(NormalizedStatus::Well),
            "Stream" => Some(NormalizedStatus::Stream),
            _ => None,
        }
    }

    pub fn is_available_equivalent(&self) -> bool {
        matches!(
            self,
            NormalizedStatus::Available
                | NormalizedStatus::PipeBorne
                | NormalizedStatus::BoreHole
                | NormalizedStatus::Well
                | NormalizedStatus::Stream
        )
    }
}

/// Null, undefined and the literal string "null" all mean "nothing was
/// recorded" and classify as the item's default status, never a parse error.
pub fn is_null_like(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(s) => {
            let t = s.trim();
            t.is_empty()
                || t.eq_ignore_ascii_case("null")
                || t.eq_ignore_ascii_case("undefined")
        }
    }
}

/// Classify a raw status under a known item rule. Pure: same inputs always
/// produce the same verdict.
pub fn classify(rule: ItemRule, raw: Option<&str>) -> NormalizedStatus {
    if is_null_like(raw) {
        // Default status for all current items
        return NormalizedStatus::NotAvailable;
    }
    let raw = match raw {
        Some(r) => r,
        None => return NormalizedStatus::NotAvailable,
    };
    match rule {
        ItemRule::Binary => heuristic_status(raw),
        ItemRule::WaterSource => classify_water_source(raw),
    }
}

/// Best-effort availability verdict from an arbitrary status string.
///
/// This is the documented low-precision fallback: exact yes/no tokens first,
/// then numeric (> 0 is available), then failure substrings, then
/// availability substrings. Anything unmatched is Unknown.
pub fn heuristic_status(raw: &str) -> NormalizedStatus {
    let lower = raw.trim().to_lowercase();

    match lower.as_str() {
        "yes" | "true" | "y" | "1" => return NormalizedStatus::Available,
        "no" | "false" | "n" | "0" | "none" | "n/a" | "na" => {
            return NormalizedStatus::NotAvailable
        }
        _ => {}
    }

    if let Ok(n) = lower.parse::<f64>() {
        return if n > 0.0 {
            NormalizedStatus::Available
        } else {
            NormalizedStatus::NotAvailable
        };
    }

    // Failure hints first: "not available" contains "available"
    if UNAVAILABLE_HINTS.iter().any(|hint| lower.contains(hint)) {
        return NormalizedStatus::NotAvailable;
    }
    if AVAILABLE_HINTS.iter().any(|hint| lower.contains(hint)) {
        return NormalizedStatus::Available;
    }

    NormalizedStatus::Unknown
}

/// Water is the one multi-valued item in the catalog: the source type is
/// retained as the label. The label set has no Unknown, so unrecognized
/// source strings default to Not Available rather than fabricating a source.
fn classify_water_source(raw: &str) -> NormalizedStatus {
    let lower = raw.trim().to_lowercase();

    if lower.contains("pipe") {
        return NormalizedStatus::PipeBorne;
    }
    if lower.contains("bore") {
        return NormalizedStatus::BoreHole;
    }
    if lower.contains("well") {
        return NormalizedStatus::Well;
    }
    if lower.contains("stream") || lower.contains("river") {
        return NormalizedStatus::Stream;
    }

    if heuristic_status(&lower) == NormalizedStatus::Available {
        tracing::warn!("unrecognized water source '{}' classified as Not Available", raw);
    }
    NormalizedStatus::NotAvailable
}
