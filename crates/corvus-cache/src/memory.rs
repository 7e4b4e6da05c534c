//! Bounded in-memory TTL tier, grounded on
//! `riptide-cache/src/adapters/memory_coordination.rs`'s `DashMap`+`Instant`
//! expiry pattern. Bounding by size (rather than the teacher's unbounded
//! coordination cache) follows the Python `cachetools.TTLCache(maxsize=...)`
//! this module replaces — eviction is insertion-order (oldest sequence
//! number first), not LRU, since the source's TTLCache is itself not
//! access-order by default.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::CachedPage;

struct Entry {
    page: CachedPage,
    expires_at: Instant,
    seq: u64,
}

pub struct MemoryTier {
    entries: DashMap<String, Entry>,
    max_size: usize,
    ttl: Duration,
    seq: AtomicU64,
}

impl MemoryTier {
    pub fn new(max_size: usize, ttl_seconds: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_size: max_size.max(1),
            ttl: Duration::from_secs(ttl_seconds),
            seq: AtomicU64::new(0),
        }
    }

    pub fn get(&self, page_name: &str) -> Option<CachedPage> {
        if let Some(entry) = self.entries.get(page_name) {
            if entry.expires_at > Instant::now() {
                return Some(entry.page.clone());
            }
            drop(entry);
            self.entries.remove(page_name);
        }
        None
    }

    pub fn insert(&self, page_name: String, page: CachedPage) {
        self.evict_expired();
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&page_name) {
            self.evict_oldest();
        }
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(
            page_name,
            Entry {
                page,
                expires_at: Instant::now() + self.ttl,
                seq,
            },
        );
    }

    pub fn remove(&self, page_name: &str) {
        self.entries.remove(page_name);
    }

    fn evict_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at > now);
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.seq)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(name: &str) -> CachedPage {
        CachedPage {
            page_name: name.to_string(),
            url: format!("https://{name}"),
            domain: name.to_string(),
            scraped_at: chrono::Utc::now(),
            content: serde_json::json!({}),
            content_type: "html".to_string(),
            char_count: 0,
        }
    }

    #[test]
    fn expires_lazily_on_read() {
        let tier = MemoryTier::new(10, 0);
        tier.insert("a".into(), page("a"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(tier.get("a").is_none());
    }

    #[test]
    fn evicts_oldest_when_over_capacity() {
        let tier = MemoryTier::new(2, 3600);
        tier.insert("a".into(), page("a"));
        tier.insert("b".into(), page("b"));
        tier.insert("c".into(), page("c"));
        assert!(tier.get("a").is_none());
        assert!(tier.get("b").is_some());
        assert!(tier.get("c").is_some());
    }
}
