use serde::{Deserialize, Serialize};

use crate::types::GeoLevel;

/// Full ancestor chain of a school, denormalized onto every observation row
/// so aggregation never needs a second lookup. A school always resolves to
/// exactly one circuit, district and region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncestorChain {
    pub circuit_id: i64,
    pub circuit_name: String,
    pub district_id: i64,
    pub district_name: String,
    pub region_id: i64,
    pub region_name: String,
}

impl AncestorChain {
    pub fn new(
        circuit_id: i64,
        circuit_name: impl Into<String>,
        district_id: i64,
        district_name: impl Into<String>,
        region_id: i64,
        region_name: impl Into<String>,
    ) -> Self {
        Self {
            circuit_id,
            circuit_name: circuit_name.into(),
            district_id,
            district_name: district_name.into(),
            region_id,
            region_name: region_name.into(),
        }
    }
}

/// Partial parent chain carried by an entity mutation: whichever ancestor
/// levels exist above the mutated entity. A school mutation fills all three
/// slots, a district mutation only the region, a region mutation none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChain {
    pub circuit_id: Option<i64>,
    pub district_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl ParentChain {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn for_school(circuit_id: i64, district_id: i64, region_id: i64) -> Self {
        Self {
            circuit_id: Some(circuit_id),
            district_id: Some(district_id),
            region_id: Some(region_id),
        }
    }

    pub fn for_circuit(district_id: i64, region_id: i64) -> Self {
        Self {
            circuit_id: None,
            district_id: Some(district_id),
            region_id: Some(region_id),
        }
    }

    pub fn for_district(region_id: i64) -> Self {
        Self {
            circuit_id: None,
            district_id: None,
            region_id: Some(region_id),
        }
    }

    /// Present ancestor nodes, nearest level first
    pub fn nodes(&self) -> Vec<(GeoLevel, i64)> {
        let mut out = Vec::with_capacity(3);
        if let Some(id) = self.circuit_id {
            out.push((GeoLevel::Circuit, id));
        }
        if let Some(id) = self.district_id {
            out.push((GeoLevel::District, id));
        }
        if let Some(id) = self.region_id {
            out.push((GeoLevel::Region, id));
        }
        out
    }
}

impl From<&AncestorChain> for ParentChain {
    fn from(chain: &AncestorChain) -> Self {
        ParentChain::for_school(chain.circuit_id, chain.district_id, chain.region_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_chain_nodes_nearest_first() {
        let chain = ParentChain::for_school(3, 2, 1);
        assert_eq!(
            chain.nodes(),
            vec![
                (GeoLevel::Circuit, 3),
                (GeoLevel::District, 2),
                (GeoLevel::Region, 1),
            ]
        );

        assert_eq!(ParentChain::for_district(1).nodes(), vec![(GeoLevel::Region, 1)]);
        assert!(ParentChain::empty().nodes().is_empty());
    }
}
