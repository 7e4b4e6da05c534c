//! Typed shapes for the Brave Search API's web/news/videos result blocks.
//!
//! Grounded on `original_source/app/core/search.py`'s dict access pattern
//! (`result.get("web", {}).get("results", [])` etc.) — here expressed as
//! typed, optional fields so a missing block just deserializes to `None`
//! instead of needing a default-dict fallback at every call site.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BraveSearchResponse {
    pub web: Option<ResultsBlock>,
    pub news: Option<ResultsBlock>,
    pub videos: Option<ResultsBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsBlock {
    #[serde(default)]
    pub results: Vec<BraveResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BraveResult {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extra_snippets: Vec<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub page_age: Option<String>,
}

impl BraveResult {
    /// The source falls back from `age` to `page_age` when both are
    /// present; `age` (the human-readable form) wins.
    pub fn display_age(&self) -> Option<&str> {
        self.age.as_deref().or(self.page_age.as_deref())
    }
}

impl BraveSearchResponse {
    /// All hits across `web`, `news`, and `videos`, in that order — the
    /// same concatenation order `generate_search_text_summary` iterates.
    pub fn all_results(&self) -> impl Iterator<Item = &BraveResult> {
        self.web
            .iter()
            .chain(self.news.iter())
            .chain(self.videos.iter())
            .flat_map(|block| block.results.iter())
    }
}

/// One query's search parameters. Built via [`SearchParams::new`] plus
/// chained setters, mirroring `riptide_reliability::FetchOptions`'s
/// builder style.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub count: u32,
    pub offset: u32,
    pub country: String,
    pub extra_snippets: bool,
    pub safe_search: String,
    pub freshness: Option<String>,
    pub timeout_seconds: u64,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            count: 20,
            offset: 0,
            country: "us".to_string(),
            extra_snippets: true,
            safe_search: "off".to_string(),
            freshness: None,
            timeout_seconds: 10,
        }
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn extra_snippets(mut self, enabled: bool) -> Self {
        self.extra_snippets = enabled;
        self
    }

    pub fn freshness(mut self, freshness: impl Into<String>) -> Self {
        self.freshness = Some(freshness.into());
        self
    }
}

/// One extracted hit, shaped for the research pipeline's URL fan-out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractedUrl {
    pub url: String,
    pub title: String,
    pub description: String,
}
