//! Invalidation planning.
//!
//! Rollups embed child data, so a write to any node stales every cached
//! query of its own type plus the rollups of every ancestor on its chain.
//! Reparenting stales two chains: the one the entity left and the one it
//! joined. Forgetting the old chain leaves the former ancestor serving a
//! stale rollup until TTL expiry.

use serde::{Deserialize, Serialize};

use crate::cache::key::{node_wildcard, type_wildcard};
use crate::hierarchy::ParentChain;
use crate::types::GeoLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Create,
    Update,
    Reparent,
    Delete,
}

/// Description of one entity write, as reported by the mutation handlers
/// after the store commit succeeds.
#[derive(Debug, Clone)]
pub struct EntityMutation {
    pub level: GeoLevel,
    pub entity_id: i64,
    pub change: ChangeKind,
    /// Ancestor chain before the write; required for reparent and delete
    pub old_chain: Option<ParentChain>,
    /// Ancestor chain after the write; required for create, update, reparent
    pub new_chain: Option<ParentChain>,
}

impl EntityMutation {
    pub fn created(level: GeoLevel, entity_id: i64, chain: ParentChain) -> Self {
        Self {
            level,
            entity_id,
            change: ChangeKind::Create,
            old_chain: None,
            new_chain: Some(chain),
        }
    }

    pub fn updated(level: GeoLevel, entity_id: i64, chain: ParentChain) -> Self {
        Self {
            level,
            entity_id,
            change: ChangeKind::Update,
            old_chain: None,
            new_chain: Some(chain),
        }
    }

    pub fn reparented(
        level: GeoLevel,
        entity_id: i64,
        old_chain: ParentChain,
        new_chain: ParentChain,
    ) -> Self {
        Self {
            level,
            entity_id,
            change: ChangeKind::Reparent,
            old_chain: Some(old_chain),
            new_chain: Some(new_chain),
        }
    }

    pub fn deleted(level: GeoLevel, entity_id: i64, chain: ParentChain) -> Self {
        Self {
            level,
            entity_id,
            change: ChangeKind::Delete,
            old_chain: Some(chain),
            new_chain: None,
        }
    }
}

/// Compute the full set of cache key patterns stale after a mutation.
///
/// - the mutated type's own wildcard, always: membership lists and cross-node
///   queries of that type may have changed anywhere;
/// - the entity's own id-scoped wildcard, always: its cached rollups embed
///   its name and chain, and on delete this is the targeted sweep of the
///   removed node's keys;
/// - the id-scoped wildcard of every ancestor node on the relevant chain(s):
///   the current chain for create/update/delete, both chains for reparent.
///
/// The result is ordered (own type, own node, then ancestors nearest-first)
/// and deduplicated when chains overlap.
pub fn plan_invalidation(mutation: &EntityMutation) -> Vec<String> {
    let mut patterns: Vec<String> = Vec::new();

    push_unique(&mut patterns, type_wildcard(mutation.level.as_str()));
    push_unique(&mut patterns, node_wildcard(mutation.level.as_str(), mutation.entity_id));

    let chains: Vec<&ParentChain> = match mutation.change {
        ChangeKind::Create | ChangeKind::Update => {
            mutation.new_chain.iter().chain(mutation.old_chain.iter()).take(1).collect()
        }
        ChangeKind::Delete => {
            mutation.old_chain.iter().chain(mutation.new_chain.iter()).take(1).collect()
        }
        ChangeKind::Reparent => {
            mutation.old_chain.iter().chain(mutation.new_chain.iter()).collect()
        }
    };

    for chain in chains {
        for (level, id) in chain.nodes() {
            push_unique(&mut patterns, node_wildcard(level.as_str(), id));
        }
    }

    patterns
}

// Pattern sets are tiny (at most eight entries), a linear scan beats a set
fn push_unique(patterns: &mut Vec<String>, pattern: String) {
    if !patterns.contains(&pattern) {
        patterns.push(pattern);
    }
}
