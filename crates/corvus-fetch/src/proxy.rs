//! Proxy selection policy, grounded on `fetcher.py`'s `_get_random_proxy`/
//! `_get_different_proxy`: a flat pool per proxy type, chosen uniformly at
//! random, with an exclusion list so a retry doesn't pick the same proxy
//! that just failed.

/// Flat pools of proxy URLs, keyed by tier. Both pools are optional — an
/// empty pool means "no proxy available", and callers fall back to a direct
/// connection rather than failing.
pub struct ProxyRotator {
    datacenter: Vec<String>,
    residential: Vec<String>,
}

impl ProxyRotator {
    pub fn new(datacenter: Vec<String>, residential: Vec<String>) -> Self {
        Self {
            datacenter,
            residential,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.datacenter.is_empty() && self.residential.is_empty()
    }

    /// A uniformly random proxy from the datacenter pool, or `None` if empty.
    pub fn random(&self) -> Option<&str> {
        self.random_from(&self.datacenter)
    }

    pub fn random_residential(&self) -> Option<&str> {
        self.random_from(&self.residential)
    }

    /// A random proxy that isn't `exclude`, falling back to any proxy if the
    /// pool only has one entry left after exclusion.
    pub fn different_from(&self, exclude: &str) -> Option<&str> {
        let candidates: Vec<&str> = self
            .datacenter
            .iter()
            .map(String::as_str)
            .filter(|p| *p != exclude)
            .collect();
        if candidates.is_empty() {
            self.random()
        } else {
            Some(candidates[fastrand::usize(..candidates.len())])
        }
    }

    fn random_from<'a>(&self, pool: &'a [String]) -> Option<&'a str> {
        if pool.is_empty() {
            None
        } else {
            Some(pool[fastrand::usize(..pool.len())].as_str())
        }
    }
}
