//! Persistent tier backing `scrape_parsed_page`, grounded on
//! `original_source/app/cache/page_cache.py`'s raw-SQL queries and on
//! `riptide-persistence/src/adapters/postgres_repository.rs`'s dynamic
//! `sqlx::query`/`query_as` + `#[instrument]` style (no compile-time
//! `query!` macro, since that needs a live `DATABASE_URL` at build time).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use corvus_types::CorvusError;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::CachedPage;

pub struct PostgresTier {
    pool: PgPool,
}

impl PostgresTier {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self), fields(%page_name))]
    pub async fn get(&self, page_name: &str) -> Result<Option<CachedPage>, CorvusError> {
        let row = sqlx::query_as::<_, (serde_json::Value, String, String, DateTime<Utc>, String, i64)>(
            "SELECT content, url, domain, scraped_at, content_type, char_count \
             FROM scrape_parsed_page \
             WHERE page_name = $1 AND validity = 'active' AND expires_at > NOW() \
             LIMIT 1",
        )
        .bind(page_name)
        .fetch_optional(&self.pool)
        .await?;

        let Some((content, url, domain, scraped_at, content_type, char_count)) = row else {
            debug!("cache miss");
            return Ok(None);
        };

        Ok(Some(CachedPage {
            page_name: page_name.to_string(),
            url,
            domain,
            scraped_at,
            content,
            content_type,
            char_count,
        }))
    }

    /// Marks the existing active row (if any) stale, then inserts the new
    /// row as active, in one transaction — so no reader ever observes two
    /// active rows for `page_name`.
    #[instrument(skip(self, page), fields(page_name = %page.page_name))]
    pub async fn set(&self, page: &CachedPage, ttl_days: i64) -> Result<(), CorvusError> {
        let expires_at = page.scraped_at + ChronoDuration::days(ttl_days.max(1));
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE scrape_parsed_page SET validity = 'stale' \
             WHERE page_name = $1 AND validity = 'active'",
        )
        .bind(&page.page_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO scrape_parsed_page \
             (page_name, url, domain, scraped_at, expires_at, validity, content, char_count, content_type) \
             VALUES ($1, $2, $3, $4, $5, 'active', $6, $7, $8)",
        )
        .bind(&page.page_name)
        .bind(&page.url)
        .bind(&page.domain)
        .bind(page.scraped_at)
        .bind(expires_at)
        .bind(&page.content)
        .bind(page.char_count)
        .bind(&page.content_type)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    #[instrument(skip(self), fields(%page_name))]
    pub async fn invalidate(&self, page_name: &str) -> Result<(), CorvusError> {
        sqlx::query(
            "UPDATE scrape_parsed_page SET validity = 'invalid' \
             WHERE page_name = $1 AND validity = 'active'",
        )
        .bind(page_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
