//! Scrape failure audit trail. Grounded on
//! `original_source/app/db/queries/failure_log.py`'s `log_failure`: a
//! best-effort insert into `scrape_failure_log` that never lets a logging
//! failure propagate out to the caller.

use sqlx::PgPool;
use tracing::{error, instrument};

use corvus_types::{FailureReason, ProxyType};
use corvus_utils::extract_domain;

fn proxy_type_str(proxy_type: ProxyType) -> &'static str {
    match proxy_type {
        ProxyType::Datacenter => "datacenter",
        ProxyType::Residential => "residential",
        ProxyType::None => "none",
    }
}

/// Records one failed scrape attempt. Errors talking to the database are
/// logged and swallowed, matching the source's `try/except Exception`
/// wrapping the whole insert.
#[instrument(skip(pool, error_log), fields(target_url = %target_url))]
#[allow(clippy::too_many_arguments)]
pub async fn log_failure(
    pool: &PgPool,
    target_url: &str,
    failure_reason: FailureReason,
    status_code: Option<u16>,
    error_log: Option<&str>,
    proxy_used: Option<&str>,
    proxy_type: Option<ProxyType>,
    attempt_count: u32,
) {
    let domain_name = extract_domain(target_url);
    let failure_category = failure_reason.category();

    let result = sqlx::query(
        "INSERT INTO scrape_failure_log \
         (target_url, domain_name, failure_reason, failure_category, \
          status_code, error_log, proxy_used, proxy_type, attempt_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(target_url)
    .bind(&domain_name)
    .bind(failure_category)
    .bind(failure_category)
    .bind(status_code.map(i32::from))
    .bind(error_log)
    .bind(proxy_used)
    .bind(proxy_type.map(proxy_type_str))
    .bind(attempt_count as i32)
    .execute(pool)
    .await;

    if let Err(e) = result {
        error!(error = %e, "failed to log scrape failure");
    }
}
