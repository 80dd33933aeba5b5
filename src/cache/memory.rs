use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::backend::{CacheError, KeyValueCache};

/// In-process cache store for tests and single-node deployments. Same
/// contract as the Redis backend, including glob-style `keys`.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.expires_at > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Shell-glob match supporting `*` only, which is all the key scheme emits
fn glob_match(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }

    let mut segments = pattern.split('*');
    let first = segments.next().unwrap_or("");
    if !text.starts_with(first) {
        return false;
    }
    let mut pos = first.len();

    let mut middle: Vec<&str> = segments.collect();
    let last = if pattern.ends_with('*') { None } else { middle.pop() };

    for segment in middle {
        if segment.is_empty() {
            continue;
        }
        match text[pos..].find(segment) {
            Some(found) => pos += found + segment.len(),
            None => return false,
        }
    }

    match last {
        Some(suffix) => text[pos..].ends_with(suffix),
        None => true,
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: evict lazily
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for key in keys {
            if entries.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|(key, entry)| entry.expires_at > now && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
