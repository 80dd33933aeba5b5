//! Cache key scheme.
//!
//! Keys render as `"<entity>:<id|''>:<signature>"`. The signature is the
//! canonical, order-independent encoding of every active filter parameter:
//! two logically identical queries must produce byte-identical keys no
//! matter the parameter insertion order, and queries differing in any value
//! must never collide. Wildcards (`"school:*"`, `"district:17:*"`) are
//! resolved by the cache backend via glob match.

use std::collections::BTreeMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// Canonical, order-independent encoding of filter parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSignature {
    params: BTreeMap<String, String>,
}

impl FilterSignature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parameter. Values are sanitized so free text can never
    /// corrupt the key structure or match unintended glob patterns.
    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_string(), sanitize(&value.to_string()));
        self
    }

    pub fn set_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    /// `k=v` pairs joined by `&`, sorted by key
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Values that survive into the key verbatim; anything else (search strings,
/// free text) is digested to a fixed hex fragment
fn is_key_safe(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn sanitize(value: &str) -> String {
    if is_key_safe(value) {
        return value.to_string();
    }
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..16].to_string()
}

/// One concrete cache key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    entity: &'static str,
    id: Option<i64>,
    signature: FilterSignature,
}

impl CacheKey {
    pub fn new(entity: &'static str, id: Option<i64>) -> Self {
        Self { entity, id, signature: FilterSignature::new() }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.signature = self.signature.set(key, value);
        self
    }

    pub fn with_opt(mut self, key: &str, value: Option<impl ToString>) -> Self {
        self.signature = self.signature.set_opt(key, value);
        self
    }

    pub fn render(&self) -> String {
        let id = self.id.map(|i| i.to_string()).unwrap_or_default();
        format!("{}:{}:{}", self.entity, id, self.signature.encode())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Pattern matching every cached query for an entity type
pub fn type_wildcard(entity: &str) -> String {
    format!("{}:*", entity)
}

/// Pattern matching every cached query for one node
pub fn node_wildcard(entity: &str, id: i64) -> String {
    format!("{}:{}:*", entity, id)
}
