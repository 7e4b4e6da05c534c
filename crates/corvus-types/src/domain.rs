//! Per-domain scraping rules owned by the domain-configuration store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{ConfigType, FilterAction, MatchType, ProxyType};

/// A fallback content-filter rule applied when no domain-specific override
/// matches. Loaded once into the store's `base_config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseConfigRule {
    pub id: Uuid,
    pub selector_type: String,
    #[serde(default)]
    pub exact: Vec<String>,
    #[serde(default)]
    pub partial: Vec<String>,
    #[serde(default)]
    pub regex: Vec<String>,
}

/// One path-pattern-scoped override, e.g. "on `/blog/*`, remove elements
/// matching this selector".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathOverride {
    pub id: Uuid,
    pub path_pattern_id: Uuid,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub config_type: ConfigType,
    pub selector_type: String,
    pub match_type: MatchType,
    pub action: FilterAction,
    #[serde(default)]
    pub values: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPattern {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub pattern: String,
    #[serde(default)]
    pub overrides: Vec<PathOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainSettings {
    pub id: Uuid,
    pub domain_id: Uuid,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub proxy_type: ProxyType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub id: Uuid,
    /// Registrable host this config governs.
    pub url: String,
    pub common_name: Option<String>,
    #[serde(default = "default_true")]
    pub scrape_allowed: bool,
    pub settings: Option<DomainSettings>,
    #[serde(default)]
    pub path_patterns: Vec<PathPattern>,
}

impl DomainConfig {
    pub fn proxy_type(&self) -> ProxyType {
        self.settings
            .as_ref()
            .map(|s| s.proxy_type)
            .unwrap_or_default()
    }
}

/// Body of a `POST /api/v1/config/domains` upsert request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfigCreateRequest {
    pub url: String,
    pub common_name: Option<String>,
    #[serde(default = "default_true")]
    pub scrape_allowed: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub proxy_type: ProxyType,
}
