//! Raw loader queries, grounded line-for-line on
//! `original_source/app/db/queries/domain_config.py`'s `load_all_domains`/
//! `load_base_config` (domain → settings → path patterns → overrides
//! fan-out, reassembled in memory rather than joined, to keep each query a
//! flat `SELECT`).

use std::collections::HashMap;

use corvus_types::{
    BaseConfigRule, DomainConfig, DomainConfigCreateRequest, DomainSettings, PathOverride,
    PathPattern,
};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn load_all_domains(pool: &PgPool) -> Result<Vec<DomainConfig>, sqlx::Error> {
    let domain_rows: Vec<(Uuid, String, Option<String>, bool, Option<Uuid>, Option<bool>, Option<String>)> =
        sqlx::query_as(
            "SELECT d.id, d.url, d.common_name, d.scrape_allowed, \
                    ds.id AS settings_id, ds.enabled, ds.proxy_type \
             FROM scrape_domain d \
             LEFT JOIN scrape_domain_settings ds ON ds.domain_id = d.id \
             ORDER BY d.url",
        )
        .fetch_all(pool)
        .await?;

    let mut domains: HashMap<Uuid, DomainConfig> = HashMap::new();
    for (id, url, common_name, scrape_allowed, settings_id, enabled, proxy_type) in domain_rows {
        let settings = settings_id.map(|settings_id| DomainSettings {
            id: settings_id,
            domain_id: id,
            enabled: enabled.unwrap_or(true),
            proxy_type: proxy_type
                .and_then(|p| serde_json::from_value(serde_json::Value::String(p)).ok())
                .unwrap_or_default(),
        });
        domains.insert(
            id,
            DomainConfig {
                id,
                url,
                common_name,
                scrape_allowed,
                settings,
                path_patterns: Vec::new(),
            },
        );
    }

    if domains.is_empty() {
        return Ok(Vec::new());
    }

    let domain_ids: Vec<Uuid> = domains.keys().copied().collect();
    let pattern_rows: Vec<(Uuid, Uuid, String)> = sqlx::query_as(
        "SELECT id, domain_id, pattern FROM scrape_path_pattern \
         WHERE domain_id = ANY($1) ORDER BY domain_id, pattern",
    )
    .bind(&domain_ids)
    .fetch_all(pool)
    .await?;

    let mut patterns: HashMap<Uuid, PathPattern> = HashMap::new();
    let mut pattern_domain: HashMap<Uuid, Uuid> = HashMap::new();
    for (id, domain_id, pattern) in pattern_rows {
        pattern_domain.insert(id, domain_id);
        patterns.insert(
            id,
            PathPattern {
                id,
                domain_id,
                pattern,
                overrides: Vec::new(),
            },
        );
    }

    if !patterns.is_empty() {
        let pattern_ids: Vec<Uuid> = patterns.keys().copied().collect();
        let override_rows: Vec<(Uuid, Uuid, bool, String, String, String, String, serde_json::Value)> =
            sqlx::query_as(
                "SELECT id, path_pattern_id, is_active, config_type, \
                        selector_type, match_type, action, values \
                 FROM scrape_path_override \
                 WHERE path_pattern_id = ANY($1) ORDER BY path_pattern_id",
            )
            .bind(&pattern_ids)
            .fetch_all(pool)
            .await?;

        for (id, path_pattern_id, is_active, config_type, selector_type, match_type, action, values) in
            override_rows
        {
            let Some(pattern) = patterns.get_mut(&path_pattern_id) else {
                continue;
            };
            let values: Vec<String> = serde_json::from_value(values).unwrap_or_default();
            let config_type = serde_json::from_value(serde_json::Value::String(config_type)).ok();
            let match_type = serde_json::from_value(serde_json::Value::String(match_type)).ok();
            let action = serde_json::from_value(serde_json::Value::String(action)).ok();
            let (Some(config_type), Some(match_type), Some(action)) = (config_type, match_type, action)
            else {
                continue;
            };
            pattern.overrides.push(PathOverride {
                id,
                path_pattern_id,
                is_active,
                config_type,
                selector_type,
                match_type,
                action,
                values,
            });
        }
    }

    for (id, pattern) in patterns {
        if let Some(domain_id) = pattern_domain.get(&id) {
            if let Some(domain) = domains.get_mut(domain_id) {
                domain.path_patterns.push(pattern);
            }
        }
    }

    Ok(domains.into_values().collect())
}

pub async fn load_base_config(pool: &PgPool) -> Result<Vec<BaseConfigRule>, sqlx::Error> {
    let rows: Vec<(Uuid, String, serde_json::Value, serde_json::Value, serde_json::Value)> =
        sqlx::query_as(
            "SELECT id, selector_type, exact, partial, regex FROM scrape_base_config",
        )
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, selector_type, exact, partial, regex)| BaseConfigRule {
            id,
            selector_type,
            exact: serde_json::from_value(exact).unwrap_or_default(),
            partial: serde_json::from_value(partial).unwrap_or_default(),
            regex: serde_json::from_value(regex).unwrap_or_default(),
        })
        .collect())
}

/// Upserts a domain row plus its settings row in one transaction, then
/// returns the freshly written config (always with an empty
/// `path_patterns` — those are only ever created through direct SQL).
/// Grounded on the same `scrape_domain`/`scrape_domain_settings` pair
/// `load_all_domains` reads, just written instead of read.
pub async fn upsert_domain(
    pool: &PgPool,
    req: &DomainConfigCreateRequest,
) -> Result<DomainConfig, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (id, url, common_name, scrape_allowed): (Uuid, String, Option<String>, bool) =
        sqlx::query_as(
            "INSERT INTO scrape_domain (url, common_name, scrape_allowed) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (url) DO UPDATE SET \
                common_name = EXCLUDED.common_name, \
                scrape_allowed = EXCLUDED.scrape_allowed, \
                updated_at = NOW() \
             RETURNING id, url, common_name, scrape_allowed",
        )
        .bind(&req.url)
        .bind(&req.common_name)
        .bind(req.scrape_allowed)
        .fetch_one(&mut *tx)
        .await?;

    let proxy_type = serde_json::to_value(req.proxy_type)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "datacenter".to_string());

    let (settings_id, enabled, proxy_type): (Uuid, bool, String) = sqlx::query_as(
        "INSERT INTO scrape_domain_settings (domain_id, enabled, proxy_type) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (domain_id) DO UPDATE SET \
            enabled = EXCLUDED.enabled, \
            proxy_type = EXCLUDED.proxy_type, \
            updated_at = NOW() \
         RETURNING id, enabled, proxy_type",
    )
    .bind(id)
    .bind(req.enabled)
    .bind(&proxy_type)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(DomainConfig {
        id,
        url,
        common_name,
        scrape_allowed,
        settings: Some(DomainSettings {
            id: settings_id,
            domain_id: id,
            enabled,
            proxy_type: serde_json::from_value(serde_json::Value::String(proxy_type))
                .unwrap_or_default(),
        }),
        path_patterns: Vec::new(),
    })
}
