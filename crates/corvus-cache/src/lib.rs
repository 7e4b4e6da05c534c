//! Two-tier page cache: a bounded in-memory TTL layer in front of an
//! optional Postgres-backed persistent layer with `active`/`stale`/
//! `invalid` row lifecycle.
//!
//! Grounded on `original_source/app/cache/page_cache.py`'s `PageCache`
//! (memory-first `get`, stale-then-insert `set`, `invalidate`) for the
//! sequencing, and on `riptide-cache/src/adapters/memory_coordination.rs`
//! for the `DashMap`-backed memory-tier idiom (expiry tracked alongside the
//! value, swept lazily on read rather than with a background task).

mod memory;
mod postgres;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub use memory::MemoryTier;
pub use postgres::PostgresTier;

/// One cached page: the parse-result subset worth re-serving without a
/// re-fetch, plus the bookkeeping fields the persistent table also carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPage {
    pub page_name: String,
    pub url: String,
    pub domain: String,
    pub scraped_at: DateTime<Utc>,
    pub content: serde_json::Value,
    pub content_type: String,
    pub char_count: i64,
}

/// Two-tier cache. The persistent tier is optional — when absent, this
/// behaves as a memory-only cache with an identical API, per spec.
pub struct PageCache {
    memory: MemoryTier,
    persistent: Option<PostgresTier>,
}

impl PageCache {
    pub fn memory_only(max_size: usize, ttl_seconds: u64) -> Self {
        Self {
            memory: MemoryTier::new(max_size, ttl_seconds),
            persistent: None,
        }
    }

    pub fn with_postgres(max_size: usize, ttl_seconds: u64, pool: sqlx::PgPool) -> Self {
        Self {
            memory: MemoryTier::new(max_size, ttl_seconds),
            persistent: Some(PostgresTier::new(pool)),
        }
    }

    /// Memory hit, else persistent hit (hydrating memory on the way out),
    /// else absent.
    #[instrument(skip(self), fields(%page_name))]
    pub async fn get(&self, page_name: &str) -> Option<CachedPage> {
        if let Some(page) = self.memory.get(page_name) {
            return Some(page);
        }

        let persistent = self.persistent.as_ref()?;
        let page = persistent.get(page_name).await.ok().flatten()?;
        self.memory.insert(page_name.to_string(), page.clone());
        Some(page)
    }

    /// Marks any existing active row stale, inserts a fresh active row with
    /// `expires_at = now + ttl_days`, then updates memory. The stale+insert
    /// sequence runs as a single persistent-store operation so readers
    /// never observe two active rows for the same `page_name`.
    #[instrument(skip(self, content), fields(%page_name, %url, %domain))]
    pub async fn set(
        &self,
        page_name: &str,
        url: &str,
        domain: &str,
        content: serde_json::Value,
        content_type: &str,
        char_count: i64,
        ttl_days: i64,
    ) -> Result<(), corvus_types::CorvusError> {
        let now = Utc::now();
        let page = CachedPage {
            page_name: page_name.to_string(),
            url: url.to_string(),
            domain: domain.to_string(),
            scraped_at: now,
            content,
            content_type: content_type.to_string(),
            char_count,
        };

        if let Some(persistent) = &self.persistent {
            persistent.set(&page, ttl_days).await?;
        }
        self.memory.insert(page_name.to_string(), page);
        Ok(())
    }

    #[instrument(skip(self), fields(%page_name))]
    pub async fn invalidate(&self, page_name: &str) -> Result<(), corvus_types::CorvusError> {
        self.memory.remove(page_name);
        if let Some(persistent) = &self.persistent {
            persistent.invalidate(page_name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_only_roundtrip() {
        let cache = PageCache::memory_only(100, 1800);
        assert!(cache.get("example_com").await.is_none());

        cache
            .set(
                "example_com",
                "https://example.com",
                "example.com",
                serde_json::json!({"text": "hello"}),
                "html",
                5,
                1,
            )
            .await
            .unwrap();

        let hit = cache.get("example_com").await.unwrap();
        assert_eq!(hit.domain, "example.com");
        assert_eq!(hit.char_count, 5);
    }

    #[tokio::test]
    async fn invalidate_removes_memory_entry() {
        let cache = PageCache::memory_only(100, 1800);
        cache
            .set(
                "example_com",
                "https://example.com",
                "example.com",
                serde_json::json!({}),
                "html",
                0,
                1,
            )
            .await
            .unwrap();
        cache.invalidate("example_com").await.unwrap();
        assert!(cache.get("example_com").await.is_none());
    }
}
