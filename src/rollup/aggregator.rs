use std::collections::{BTreeMap, HashMap};

use futures::StreamExt;

use crate::catalog::ItemCatalog;
use crate::error::RollupError;
use crate::hierarchy::AncestorChain;
use crate::reader::{Observation, ObservationStream};
use crate::rollup::summary::{ItemSummary, LevelSummary};
use crate::types::GeoScope;

/// Folds classified observations into per-school summaries, then recursively
/// merges school -> circuit -> district -> region -> nation.
///
/// One builder per rollup computation: feed it the reader's stream, then
/// `finish` with the requested scope. Pure in-memory computation; every
/// suspension point lives in the reader.
pub struct RollupBuilder<'a> {
    catalog: &'a ItemCatalog,
    schools: HashMap<i64, SchoolAcc>,
}

struct SchoolAcc {
    name: String,
    chain: AncestorChain,
    items: BTreeMap<String, ItemSummary>,
}

#[derive(Clone)]
struct ParentRef {
    id: i64,
    name: String,
}

impl<'a> RollupBuilder<'a> {
    pub fn new(catalog: &'a ItemCatalog) -> Self {
        Self { catalog, schools: HashMap::new() }
    }

    /// Classify and count one observation.
    ///
    /// The reader's latest-wins contract means at most one fact per
    /// (school, item) reaches us; a second one means upstream data
    /// corruption, and summing it would double count every ancestor level.
    pub fn push(&mut self, obs: &Observation) -> Result<(), RollupError> {
        let school = self.schools.entry(obs.school_id).or_insert_with(|| SchoolAcc {
            name: obs.school_name.clone(),
            chain: obs.chain.clone(),
            items: BTreeMap::new(),
        });

        if school.items.contains_key(&obs.item_name) {
            return Err(RollupError::DuplicateObservation {
                school_id: obs.school_id,
                item_name: obs.item_name.clone(),
                year: obs.period.year,
                term: obs.period.term,
            });
        }

        let status = self.catalog.classify(&obs.item_name, obs.raw_status.as_deref());
        school
            .items
            .entry(obs.item_name.clone())
            .or_insert_with(|| ItemSummary::new(obs.item_name.clone()))
            .record(status);
        Ok(())
    }

    /// Drain the observation stream in one pass
    pub async fn consume(&mut self, mut stream: ObservationStream<'_>) -> Result<(), RollupError> {
        while let Some(obs) = stream.next().await {
            self.push(&obs?)?;
        }
        Ok(())
    }

    /// Fold everything up and shape the summary for the requested scope
    pub fn finish(self, scope: &GeoScope) -> LevelSummary {
        if let GeoScope::School(id) = scope {
            return match self.schools.get(id) {
                Some(acc) => LevelSummary {
                    scope: *scope,
                    name: Some(acc.name.clone()),
                    items: sorted_items(acc.items.clone()),
                    children: Vec::new(),
                },
                None => LevelSummary::empty(*scope),
            };
        }

        // Circuit level: merge the schools beneath each circuit. Per-school
        // children are not retained; school counts are visible in totals.
        let mut circuits: BTreeMap<i64, (String, ParentRef, ParentRef, Vec<BTreeMap<String, ItemSummary>>)> =
            BTreeMap::new();
        for acc in self.schools.into_values() {
            let entry = circuits.entry(acc.chain.circuit_id).or_insert_with(|| {
                (
                    acc.chain.circuit_name.clone(),
                    ParentRef { id: acc.chain.district_id, name: acc.chain.district_name.clone() },
                    ParentRef { id: acc.chain.region_id, name: acc.chain.region_name.clone() },
                    Vec::new(),
                )
            });
            entry.3.push(acc.items);
        }

        let circuit_nodes: Vec<(ParentRef, ParentRef, LevelSummary)> = circuits
            .into_iter()
            .map(|(id, (name, district, region, school_items))| {
                let items = aggregate_up(school_items.iter().map(|m| m.values()));
                let summary = LevelSummary {
                    scope: GeoScope::Circuit(id),
                    name: Some(name),
                    items,
                    children: Vec::new(),
                };
                (district, region, summary)
            })
            .collect();

        if let GeoScope::Circuit(_) = scope {
            return Self::pick(circuit_nodes.into_iter().map(|(_, _, s)| s), scope);
        }

        // District level: circuits retained as drill-down children
        let mut districts: BTreeMap<i64, (String, ParentRef, Vec<LevelSummary>)> = BTreeMap::new();
        for (district, region, summary) in circuit_nodes {
            districts
                .entry(district.id)
                .or_insert_with(|| (district.name, region, Vec::new()))
                .2
                .push(summary);
        }

        let district_nodes: Vec<(ParentRef, LevelSummary)> = districts
            .into_iter()
            .map(|(id, (name, region, children))| {
                let items = aggregate_up(children.iter().map(|c| c.items.iter()));
                let summary = LevelSummary {
                    scope: GeoScope::District(id),
                    name: Some(name),
                    items,
                    children,
                };
                (region, summary)
            })
            .collect();

        if let GeoScope::District(_) = scope {
            return Self::pick(district_nodes.into_iter().map(|(_, s)| s), scope);
        }

        // Region level: districts (with their circuit children) retained
        let mut regions: BTreeMap<i64, (String, Vec<LevelSummary>)> = BTreeMap::new();
        for (region, summary) in district_nodes {
            regions
                .entry(region.id)
                .or_insert_with(|| (region.name, Vec::new()))
                .1
                .push(summary);
        }

        let region_nodes: Vec<LevelSummary> = regions
            .into_iter()
            .map(|(id, (name, children))| LevelSummary {
                scope: GeoScope::Region(id),
                name: Some(name),
                items: aggregate_up(children.iter().map(|c| c.items.iter())),
                children,
            })
            .collect();

        if let GeoScope::Region(_) = scope {
            return Self::pick(region_nodes.into_iter(), scope);
        }

        LevelSummary {
            scope: GeoScope::Nation,
            name: None,
            items: aggregate_up(region_nodes.iter().map(|c| c.items.iter())),
            children: region_nodes,
        }
    }

    fn pick(nodes: impl Iterator<Item = LevelSummary>, scope: &GeoScope) -> LevelSummary {
        for node in nodes {
            if node.scope == *scope {
                return node;
            }
        }
        LevelSummary::empty(*scope)
    }
}

/// Pure sum-by-key merge of child item summaries into a parent level.
/// A parent's counts are exactly the sum of its children's counts for the
/// same item, at every level.
pub fn aggregate_up<'a, C, I>(children: C) -> Vec<ItemSummary>
where
    C: IntoIterator<Item = I>,
    I: IntoIterator<Item = &'a ItemSummary>,
{
    let mut merged: BTreeMap<String, ItemSummary> = BTreeMap::new();
    for child in children {
        for item in child {
            merged
                .entry(item.item_name.clone())
                .or_insert_with(|| ItemSummary::new(item.item_name.clone()))
                .merge(item);
        }
    }
    sorted_items(merged)
}

// Display ordering only; carries no semantic weight
fn sorted_items(map: BTreeMap<String, ItemSummary>) -> Vec<ItemSummary> {
    let mut items: Vec<ItemSummary> = map.into_values().collect();
    items.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.item_name.cmp(&b.item_name)));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportingPeriod;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn obs(school_id: i64, chain: &AncestorChain, item: &str, status: Option<&str>) -> Observation {
        Observation {
            id: Uuid::new_v4(),
            school_id,
            school_name: format!("School {}", school_id),
            chain: chain.clone(),
            item_name: item.to_string(),
            raw_status: status.map(str::to_string),
            period: ReportingPeriod::new(2024, 1),
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn chain(circuit: i64, district: i64, region: i64) -> AncestorChain {
        AncestorChain::new(
            circuit,
            format!("Circuit {}", circuit),
            district,
            format!("District {}", district),
            region,
            format!("Region {}", region),
        )
    }

    #[test]
    fn duplicate_observation_fails_loudly() {
        let catalog = ItemCatalog::sanitation();
        let mut builder = RollupBuilder::new(&catalog);
        let c = chain(1, 1, 1);

        builder.push(&obs(5, &c, "Urinal", Some("Yes"))).unwrap();
        let err = builder.push(&obs(5, &c, "Urinal", Some("No"))).unwrap_err();
        assert!(matches!(
            err,
            RollupError::DuplicateObservation { school_id: 5, .. }
        ));
    }

    #[test]
    fn same_item_across_schools_is_not_a_duplicate() {
        let catalog = ItemCatalog::sanitation();
        let mut builder = RollupBuilder::new(&catalog);
        let c = chain(1, 1, 1);

        builder.push(&obs(1, &c, "Urinal", Some("Yes"))).unwrap();
        builder.push(&obs(2, &c, "Urinal", Some("Yes"))).unwrap();
        let summary = builder.finish(&GeoScope::Circuit(1));
        assert_eq!(summary.item("Urinal").unwrap().total, 2);
    }

    #[test]
    fn parent_counts_are_sums_of_children_at_every_level() {
        let catalog = ItemCatalog::sanitation();
        let mut builder = RollupBuilder::new(&catalog);

        // Two circuits in district 1, one circuit in district 2; all region 1
        let chains = [chain(1, 1, 1), chain(2, 1, 1), chain(3, 2, 1)];
        let statuses = [Some("Yes"), Some("No"), None, Some("good"), Some("broken")];
        let mut school_id = 0;
        for c in &chains {
            for status in &statuses {
                school_id += 1;
                builder.push(&obs(school_id, c, "Toilet (Seat/Cubicle)", *status)).unwrap();
            }
        }

        let nation = builder.finish(&GeoScope::Nation);
        let region = nation.child(GeoScope::Region(1)).unwrap();
        assert_eq!(region.children.len(), 2);

        let item = "Toilet (Seat/Cubicle)";
        for district in &region.children {
            let district_item = district.item(item).unwrap();
            let summed = aggregate_up(district.children.iter().map(|c| c.items.iter()));
            let summed_item = summed.iter().find(|i| i.item_name == item).unwrap();
            assert_eq!(district_item, summed_item);
        }

        let region_item = region.item(item).unwrap();
        assert_eq!(region_item.total, 15);
        assert_eq!(
            region_item.status_counts.values().sum::<u64>(),
            region_item.total
        );
        // 2 available-equivalent per circuit ("Yes", "good")
        assert_eq!(region_item.count("Available"), 6);
        assert_eq!(region_item.count("Not Available"), 9);
        assert_eq!(nation.item(item).unwrap(), region_item);
    }

    #[test]
    fn items_are_ordered_by_total_descending() {
        let catalog = ItemCatalog::sanitation();
        let mut builder = RollupBuilder::new(&catalog);
        let c = chain(1, 1, 1);

        for school in 1..=3 {
            builder.push(&obs(school, &c, "Water", Some("pipe borne"))).unwrap();
        }
        builder.push(&obs(1, &c, "Urinal", Some("Yes"))).unwrap();

        let summary = builder.finish(&GeoScope::Circuit(1));
        assert_eq!(summary.items[0].item_name, "Water");
        assert_eq!(summary.items[1].item_name, "Urinal");
    }

    #[test]
    fn unmatched_scope_yields_an_empty_summary() {
        let catalog = ItemCatalog::sanitation();
        let mut builder = RollupBuilder::new(&catalog);
        builder.push(&obs(1, &chain(1, 1, 1), "Urinal", Some("Yes"))).unwrap();

        let summary = builder.finish(&GeoScope::District(99));
        assert!(summary.items.is_empty());
        assert!(summary.children.is_empty());
        assert_eq!(summary.scope, GeoScope::District(99));
    }

    #[test]
    fn school_scope_keeps_no_children() {
        let catalog = ItemCatalog::wash();
        let mut builder = RollupBuilder::new(&catalog);
        builder.push(&obs(4, &chain(1, 1, 1), "Soap", Some("Available"))).unwrap();

        let summary = builder.finish(&GeoScope::School(4));
        assert_eq!(summary.name.as_deref(), Some("School 4"));
        assert_eq!(summary.item("Soap").unwrap().count("Available"), 1);
        assert!(summary.children.is_empty());
    }
}
