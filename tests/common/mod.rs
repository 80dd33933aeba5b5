#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use emis_rollup_rust::cache::MemoryCache;
use emis_rollup_rust::catalog::ItemCatalog;
use emis_rollup_rust::hierarchy::AncestorChain;
use emis_rollup_rust::reader::{MemoryReader, Observation};
use emis_rollup_rust::services::RollupService;
use emis_rollup_rust::types::ReportingPeriod;

pub const PERIOD: ReportingPeriod = ReportingPeriod { year: 2024, term: 1, week: None };

pub fn chain(
    circuit: (i64, &str),
    district: (i64, &str),
    region: (i64, &str),
) -> AncestorChain {
    AncestorChain::new(circuit.0, circuit.1, district.0, district.1, region.0, region.1)
}

pub fn submitted(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap()
}

pub fn obs(
    school: (i64, &str),
    chain: &AncestorChain,
    item: &str,
    status: Option<&str>,
) -> Observation {
    obs_at(school, chain, item, status, 0)
}

pub fn obs_at(
    school: (i64, &str),
    chain: &AncestorChain,
    item: &str,
    status: Option<&str>,
    minute: u32,
) -> Observation {
    Observation {
        id: Uuid::new_v4(),
        school_id: school.0,
        school_name: school.1.to_string(),
        chain: chain.clone(),
        item_name: item.to_string(),
        raw_status: status.map(str::to_string),
        period: PERIOD,
        submitted_at: submitted(minute),
    }
}

pub struct TestEnv {
    pub service: RollupService,
    pub reader: Arc<MemoryReader>,
    pub cache: Arc<MemoryCache>,
}

pub fn env(observations: Vec<Observation>, catalog: ItemCatalog) -> TestEnv {
    let reader = Arc::new(MemoryReader::new(observations));
    let cache = Arc::new(MemoryCache::new());
    let service =
        RollupService::with_cache_enabled(reader.clone(), cache.clone(), catalog, true);
    TestEnv { service, reader, cache }
}
