//! The domain-configuration snapshot store: load once, refresh
//! periodically, serve every query from the in-memory snapshot. Grounded
//! on `original_source/scraper-service/app/domain_config/config_store.py`'s
//! `DomainConfigStore` (`start`/`stop`/`_periodic_refresh` task lifecycle,
//! snapshot-local query methods).

use std::collections::HashMap;
use std::sync::RwLock;

use corvus_types::{ConfigType, CorvusError, DomainConfig, ProxyType};
use corvus_utils::{extract_domain, match_path};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::queries;

const REFRESH_INTERVAL_SECONDS: u64 = 300;

#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub content_filter: Vec<ResolvedOverride>,
    pub main_content: Vec<ResolvedOverride>,
}

#[derive(Debug, Clone)]
pub struct ResolvedOverride {
    pub selector_type: String,
    pub match_type: corvus_types::MatchType,
    pub action: corvus_types::FilterAction,
    pub values: Vec<String>,
}

struct Snapshot {
    domains: HashMap<String, DomainConfig>,
    base_config: Vec<corvus_types::BaseConfigRule>,
}

pub struct DomainConfigStore {
    pool: PgPool,
    snapshot: RwLock<Snapshot>,
    refresh_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl DomainConfigStore {
    pub async fn start(pool: PgPool) -> Result<std::sync::Arc<Self>, CorvusError> {
        let store = std::sync::Arc::new(Self {
            pool,
            snapshot: RwLock::new(Snapshot {
                domains: HashMap::new(),
                base_config: Vec::new(),
            }),
            refresh_task: std::sync::Mutex::new(None),
        });

        store.refresh().await;

        let weak = std::sync::Arc::downgrade(&store);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(REFRESH_INTERVAL_SECONDS)).await;
                let Some(store) = weak.upgrade() else {
                    break;
                };
                store.refresh().await;
            }
        });
        *store.refresh_task.lock().unwrap() = Some(handle);

        let (domain_count, rule_count) = {
            let snap = store.snapshot.read().unwrap();
            (snap.domains.len(), snap.base_config.len())
        };
        info!(domain_count, rule_count, "domain config store started");
        Ok(store)
    }

    pub fn stop(&self) {
        if let Some(handle) = self.refresh_task.lock().unwrap().take() {
            handle.abort();
        }
        info!("domain config store stopped");
    }

    #[instrument(skip(self))]
    async fn refresh(&self) {
        match queries::load_all_domains(&self.pool).await {
            Ok(domains) => match queries::load_base_config(&self.pool).await {
                Ok(base_config) => {
                    let domains: HashMap<String, DomainConfig> =
                        domains.into_iter().map(|d| (d.url.clone(), d)).collect();
                    debug!(
                        domain_count = domains.len(),
                        rule_count = base_config.len(),
                        "domain config store refreshed"
                    );
                    let mut snap = self.snapshot.write().unwrap();
                    snap.domains = domains;
                    snap.base_config = base_config;
                }
                Err(e) => error!(error = %e, "failed to load base config"),
            },
            Err(e) => error!(error = %e, "failed to load domains"),
        }
    }

    pub fn get_domain(&self, url: &str) -> Option<DomainConfig> {
        let domain_name = extract_domain(url);
        self.snapshot.read().unwrap().domains.get(&domain_name).cloned()
    }

    pub fn is_scrape_allowed(&self, url: &str) -> bool {
        self.get_domain(url).map(|c| c.scrape_allowed).unwrap_or(true)
    }

    pub fn proxy_type(&self, url: &str) -> ProxyType {
        self.get_domain(url)
            .map(|c| c.proxy_type())
            .unwrap_or_default()
    }

    pub fn base_config(&self) -> Vec<corvus_types::BaseConfigRule> {
        self.snapshot.read().unwrap().base_config.clone()
    }

    pub fn all_domains(&self) -> Vec<DomainConfig> {
        self.snapshot.read().unwrap().domains.values().cloned().collect()
    }

    /// Writes through to Postgres then refreshes the snapshot so the new
    /// or updated domain is immediately visible to `is_scrape_allowed`/
    /// `overrides_for_path` without waiting for the next periodic refresh.
    #[instrument(skip(self, req))]
    pub async fn upsert_domain(
        &self,
        req: &corvus_types::DomainConfigCreateRequest,
    ) -> Result<DomainConfig, CorvusError> {
        let config = queries::upsert_domain(&self.pool, req).await?;
        self.refresh().await;
        Ok(config)
    }

    /// Resolves the best-matching path pattern (via [`corvus_utils::match_path`]'s
    /// specificity scoring) and groups its active overrides by `config_type`.
    pub fn overrides_for_path(&self, url: &str, path: &str) -> PathOverrides {
        let Some(config) = self.get_domain(url) else {
            return PathOverrides::default();
        };
        if config.path_patterns.is_empty() {
            return PathOverrides::default();
        }

        let patterns: Vec<&str> = config
            .path_patterns
            .iter()
            .map(|pp| pp.pattern.as_str())
            .collect();
        let Some(matched) = match_path(path, &patterns) else {
            return PathOverrides::default();
        };

        let Some(pattern) = config.path_patterns.iter().find(|pp| pp.pattern == matched) else {
            return PathOverrides::default();
        };

        let mut result = PathOverrides::default();
        for override_rule in &pattern.overrides {
            if !override_rule.is_active {
                continue;
            }
            let resolved = ResolvedOverride {
                selector_type: override_rule.selector_type.clone(),
                match_type: override_rule.match_type,
                action: override_rule.action,
                values: override_rule.values.clone(),
            };
            match override_rule.config_type {
                ConfigType::ContentFilter => result.content_filter.push(resolved),
                ConfigType::MainContent => result.main_content.push(resolved),
            }
        }
        result
    }
}
