//! Ad/tracker domain blocklist, loaded from EasyList-style filter lists.
//!
//! Grounded on `app/core/parser/domain_filter.py`'s `AdblockConfigLoader` +
//! `DomainFilter`. The source implements both as process-wide singletons
//! keyed by list selection; here that's a single `DomainFilter` instance,
//! constructed once and handed to whatever needs it (the flattener), with
//! the loaded host set held behind a lock so a refresh can swap in a new
//! immutable snapshot without readers ever seeing a torn update.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;
use std::time::Duration;

use tracing::{debug, info, warn};

struct ListEntry {
    url: &'static str,
    local_file: &'static str,
}

const LIST_REGISTRY: &[(&str, ListEntry)] = &[
    (
        "easylist",
        ListEntry {
            url: "https://easylist.to/easylist/easylist.txt",
            local_file: "easylist-filters.txt",
        },
    ),
    (
        "fanboy",
        ListEntry {
            url: "https://easylist.to/easylist/fanboy-annoyance.txt",
            local_file: "fanboy-annoyance-filters.txt",
        },
    ),
];

fn registry_lookup(list_key: &str) -> Option<&'static ListEntry> {
    LIST_REGISTRY
        .iter()
        .find(|(key, _)| *key == list_key)
        .map(|(_, entry)| entry)
}

/// Fetches (and disk-caches) named EasyList-style filter lists. On fetch
/// failure, falls back to the last cached copy on disk; if neither is
/// available, the list contributes nothing.
pub struct AdblockConfigLoader {
    cache_dir: PathBuf,
    client: reqwest::Client,
}

impl AdblockConfigLoader {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_temp_dir() -> Self {
        Self::new(std::env::temp_dir().join("corvus_domain_filters"))
    }

    pub async fn load_config(&self, list_key: &str) -> String {
        let Some(entry) = registry_lookup(list_key) else {
            warn!(list_key, "unknown filter list key");
            return String::new();
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.cache_dir).await {
            warn!(error = %e, "failed to create filter cache dir");
        }
        let local_path = self.cache_dir.join(entry.local_file);

        match self.fetch_remote(entry.url).await {
            Some(content) => {
                if let Err(e) = tokio::fs::write(&local_path, &content).await {
                    warn!(error = %e, "failed to cache filter list to disk");
                }
                debug!(list_key, "fetched filter list from network");
                content
            }
            None => match tokio::fs::read_to_string(&local_path).await {
                Ok(content) => {
                    debug!(list_key, "loaded filter list from local cache");
                    content
                }
                Err(_) => {
                    warn!(list_key, "no filter list available, network and cache both empty");
                    String::new()
                }
            },
        }
    }

    async fn fetch_remote(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }
}

/// Host-set blocklist built from one or more named filter lists. Only
/// `||domain^` anchored rules (no options, no element-hiding, no
/// exceptions) are retained — the subset EasyList uses for DNS-style
/// blocking.
pub struct DomainFilter {
    blocked_domains: RwLock<Arc<HashSet<String>>>,
}

impl DomainFilter {
    /// An empty filter that blocks nothing, for callers that haven't
    /// configured a blocklist source.
    pub fn empty() -> Self {
        Self {
            blocked_domains: RwLock::new(Arc::new(HashSet::new())),
        }
    }

    pub async fn load(loader: &AdblockConfigLoader, list_keys: &[&str]) -> Self {
        let filter = Self::empty();
        filter.refresh(loader, list_keys).await;
        filter
    }

    /// Reloads the blocklist from `loader` and atomically swaps the
    /// published snapshot in; readers never observe a partially-built set.
    pub async fn refresh(&self, loader: &AdblockConfigLoader, list_keys: &[&str]) {
        let mut domains = HashSet::new();
        let mut loaded = 0usize;
        let mut skipped = 0usize;

        for list_key in list_keys {
            let content = loader.load_config(list_key).await;
            for line in content.lines() {
                match process_rule(line.trim()) {
                    Some(domain) => {
                        domains.insert(domain);
                        loaded += 1;
                    }
                    None => skipped += 1,
                }
            }
        }

        info!(
            lists = list_keys.join(", "),
            loaded, skipped, "domain filter refreshed"
        );

        let mut guard = self.blocked_domains.write().expect("domain filter lock poisoned");
        *guard = Arc::new(domains);
    }

    /// True if `url`'s host, or any parent domain of it, is on the
    /// blocklist. Never panics on a malformed URL — just returns `false`.
    pub fn should_block(&self, url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };

        let snapshot = self.blocked_domains.read().expect("domain filter lock poisoned").clone();
        if snapshot.contains(host) {
            return true;
        }
        let labels: Vec<&str> = host.split('.').collect();
        for i in 1..labels.len() {
            let parent = labels[i..].join(".");
            if snapshot.contains(&parent) {
                return true;
            }
        }
        false
    }
}

/// Keeps only anchored `||domain^` rules with no options/exceptions/
/// element-hiding syntax; everything else is skipped (not an error).
fn process_rule(rule: &str) -> Option<String> {
    if rule.is_empty() || rule.starts_with('!') {
        return None;
    }
    if rule.contains("##") || rule.starts_with("@@") || rule.contains('$') {
        return None;
    }
    if let Some(rest) = rule.strip_prefix("||") {
        let caret = rest.find('^')?;
        let domain = &rest[..caret];
        if domain.is_empty() || domain.contains('/') || domain.contains(':') {
            return None;
        }
        return Some(domain.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_rule_keeps_anchored_domain_rules() {
        assert_eq!(process_rule("||ads.example.com^"), Some("ads.example.com".to_string()));
    }

    #[test]
    fn process_rule_skips_options_and_exceptions() {
        assert_eq!(process_rule("||example.com^$third-party"), None);
        assert_eq!(process_rule("@@||example.com^"), None);
        assert_eq!(process_rule("example.com##.ad-banner"), None);
        assert_eq!(process_rule("! comment"), None);
    }

    #[tokio::test]
    async fn should_block_checks_host_and_parents() {
        let filter = DomainFilter::empty();
        {
            let mut guard = filter.blocked_domains.write().unwrap();
            *guard = Arc::new(["ads.example.com".to_string()].into_iter().collect());
        }
        assert!(filter.should_block("https://ads.example.com/x"));
        assert!(filter.should_block("https://sub.ads.example.com/x"));
        assert!(!filter.should_block("https://example.com/x"));
    }

    #[test]
    fn empty_filter_blocks_nothing() {
        let filter = DomainFilter::empty();
        assert!(!filter.should_block("https://anything.example.com"));
    }
}
