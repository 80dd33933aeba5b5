/// Shared types used across the codebase

use serde::{Deserialize, Serialize};

/// Geographic entity levels, leaf to top. Nation sits above Region but is
/// implicit: it has no id and no row in the store, so it is a query scope
/// (`GeoScope::Nation`) rather than a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoLevel {
    School,
    Circuit,
    District,
    Region,
}

impl GeoLevel {
    /// Entity tag used in cache keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoLevel::School => "school",
            GeoLevel::Circuit => "circuit",
            GeoLevel::District => "district",
            GeoLevel::Region => "region",
        }
    }

    pub fn parent(&self) -> Option<GeoLevel> {
        match self {
            GeoLevel::School => Some(GeoLevel::Circuit),
            GeoLevel::Circuit => Some(GeoLevel::District),
            GeoLevel::District => Some(GeoLevel::Region),
            GeoLevel::Region => None,
        }
    }

    /// Ancestor levels, nearest first
    pub fn ancestors(&self) -> &'static [GeoLevel] {
        match self {
            GeoLevel::School => &[GeoLevel::Circuit, GeoLevel::District, GeoLevel::Region],
            GeoLevel::Circuit => &[GeoLevel::District, GeoLevel::Region],
            GeoLevel::District => &[GeoLevel::Region],
            GeoLevel::Region => &[],
        }
    }
}

/// A resolved query scope: one concrete node in the hierarchy, or the
/// implicit nation-wide root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoScope {
    Nation,
    Region(i64),
    District(i64),
    Circuit(i64),
    School(i64),
}

impl GeoScope {
    pub fn entity_tag(&self) -> &'static str {
        match self {
            GeoScope::Nation => "nation",
            GeoScope::Region(_) => "region",
            GeoScope::District(_) => "district",
            GeoScope::Circuit(_) => "circuit",
            GeoScope::School(_) => "school",
        }
    }

    pub fn entity_id(&self) -> Option<i64> {
        match self {
            GeoScope::Nation => None,
            GeoScope::Region(id)
            | GeoScope::District(id)
            | GeoScope::Circuit(id)
            | GeoScope::School(id) => Some(*id),
        }
    }

    pub fn level(&self) -> Option<GeoLevel> {
        match self {
            GeoScope::Nation => None,
            GeoScope::Region(_) => Some(GeoLevel::Region),
            GeoScope::District(_) => Some(GeoLevel::District),
            GeoScope::Circuit(_) => Some(GeoLevel::Circuit),
            GeoScope::School(_) => Some(GeoLevel::School),
        }
    }
}

/// Wire-shaped geographic filter as it arrives from route handlers.
/// At most one id is expected; when several are supplied the most specific
/// one wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoFilter {
    pub school_id: Option<i64>,
    pub circuit_id: Option<i64>,
    pub district_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl GeoFilter {
    pub fn nation() -> Self {
        Self::default()
    }

    pub fn school(id: i64) -> Self {
        Self { school_id: Some(id), ..Self::default() }
    }

    pub fn circuit(id: i64) -> Self {
        Self { circuit_id: Some(id), ..Self::default() }
    }

    pub fn district(id: i64) -> Self {
        Self { district_id: Some(id), ..Self::default() }
    }

    pub fn region(id: i64) -> Self {
        Self { region_id: Some(id), ..Self::default() }
    }

    /// Most specific non-null id wins; all-empty means nation-wide
    pub fn resolve(&self) -> GeoScope {
        if let Some(id) = self.school_id {
            GeoScope::School(id)
        } else if let Some(id) = self.circuit_id {
            GeoScope::Circuit(id)
        } else if let Some(id) = self.district_id {
            GeoScope::District(id)
        } else if let Some(id) = self.region_id {
            GeoScope::Region(id)
        } else {
            GeoScope::Nation
        }
    }
}

/// Reporting period filter dimension, orthogonal to geography.
/// Two periods are equal iff all present fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year: i32,
    pub term: u8,
    pub week: Option<u8>,
}

impl ReportingPeriod {
    pub fn new(year: i32, term: u8) -> Self {
        Self { year, term, week: None }
    }

    pub fn with_week(year: i32, term: u8, week: u8) -> Self {
        Self { year, term, week: Some(week) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_specific_filter_wins() {
        let filter = GeoFilter {
            school_id: Some(7),
            circuit_id: Some(3),
            district_id: None,
            region_id: Some(1),
        };
        assert_eq!(filter.resolve(), GeoScope::School(7));

        let filter = GeoFilter { circuit_id: Some(3), region_id: Some(1), ..GeoFilter::default() };
        assert_eq!(filter.resolve(), GeoScope::Circuit(3));

        assert_eq!(GeoFilter::nation().resolve(), GeoScope::Nation);
    }

    #[test]
    fn period_equality_includes_week() {
        assert_eq!(ReportingPeriod::new(2024, 1), ReportingPeriod::new(2024, 1));
        assert_ne!(ReportingPeriod::new(2024, 1), ReportingPeriod::with_week(2024, 1, 4));
        assert_ne!(ReportingPeriod::new(2024, 1), ReportingPeriod::new(2024, 2));
    }

    #[test]
    fn ancestor_walk_ends_at_region() {
        assert_eq!(GeoLevel::School.ancestors().len(), 3);
        assert_eq!(GeoLevel::Region.ancestors().len(), 0);
        assert_eq!(GeoLevel::Circuit.parent(), Some(GeoLevel::District));
        assert_eq!(GeoLevel::Region.parent(), None);
    }
}
