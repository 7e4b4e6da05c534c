//! Environment-driven process settings, grounded on
//! `riptide-config/src/env.rs`'s `EnvConfigLoader` (required-vs-optional
//! vars, comma-separated list parsing, typed conversion errors) —
//! simplified to a flat `Settings` struct since this system's env surface
//! is the fixed list in spec.md §6 rather than an open-ended prefix scan.

use corvus_types::CorvusError;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub database_url: Option<String>,
    pub datacenter_proxies: Vec<String>,
    pub residential_proxies: Vec<String>,
    pub brave_api_key: Option<String>,
    pub brave_api_key_ai: Option<String>,
    pub playwright_pool_size: usize,
    pub page_cache_ttl_seconds: u64,
    pub page_cache_max_size: usize,
    pub default_scrape_ttl_days: i64,
    pub max_scrape_concurrency: usize,
    pub max_research_concurrency: usize,
}

impl Settings {
    /// Loads every variable named in spec.md §6. `API_KEY` is the only
    /// required one; everything else falls back to a sane default so a
    /// bare `cargo run` with no `.env` still starts (memory-only cache, no
    /// search, no proxies).
    pub fn from_env() -> Result<Self, CorvusError> {
        Self::from_env_fn(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_env_fn(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CorvusError> {
        let api_key = lookup("API_KEY")
            .ok_or_else(|| CorvusError::settings("API_KEY", "required environment variable is not set"))?;

        Ok(Self {
            api_key,
            database_url: lookup("DATABASE_URL"),
            datacenter_proxies: parse_list(lookup("DATACENTER_PROXIES")),
            residential_proxies: parse_list(lookup("RESIDENTIAL_PROXIES")),
            brave_api_key: lookup("BRAVE_API_KEY"),
            brave_api_key_ai: lookup("BRAVE_API_KEY_AI"),
            playwright_pool_size: parse_or(lookup("PLAYWRIGHT_POOL_SIZE"), 3)?,
            page_cache_ttl_seconds: parse_or(lookup("PAGE_CACHE_TTL_SECONDS"), 1800)?,
            page_cache_max_size: parse_or(lookup("PAGE_CACHE_MAX_SIZE"), 1000)?,
            default_scrape_ttl_days: parse_or(lookup("DEFAULT_SCRAPE_TTL_DAYS"), 30)?,
            max_scrape_concurrency: parse_or(lookup("MAX_SCRAPE_CONCURRENCY"), 20)?,
            max_research_concurrency: parse_or(lookup("MAX_RESEARCH_CONCURRENCY"), 5)?,
        })
    }

    pub fn persistent_cache_enabled(&self) -> bool {
        self.database_url.is_some()
    }
}

fn parse_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> Result<T, CorvusError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| CorvusError::settings("<env>", format!("cannot parse value: {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_api_key_is_an_error() {
        let err = Settings::from_env_fn(|_| None).unwrap_err();
        assert!(matches!(err, CorvusError::SettingsError { .. }));
    }

    #[test]
    fn defaults_fill_in_when_unset() {
        let mut env = HashMap::new();
        env.insert("API_KEY".to_string(), "secret".to_string());
        let settings = Settings::from_env_fn(|k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.playwright_pool_size, 3);
        assert!(!settings.persistent_cache_enabled());
    }

    #[test]
    fn proxy_lists_split_on_comma() {
        let mut env = HashMap::new();
        env.insert("API_KEY".to_string(), "secret".to_string());
        env.insert(
            "DATACENTER_PROXIES".to_string(),
            "http://a:8080, http://b:8080".to_string(),
        );
        let settings = Settings::from_env_fn(|k| env.get(k).cloned()).unwrap();
        assert_eq!(
            settings.datacenter_proxies,
            vec!["http://a:8080", "http://b:8080"]
        );
    }
}
