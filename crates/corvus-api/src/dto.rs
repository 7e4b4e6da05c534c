//! Request/response bodies for the contract table in spec.md §6. Kept as
//! a flat module the way `riptide-api::dto` collects its wire shapes,
//! separate from the handlers that validate and fill them.

use serde::{Deserialize, Serialize};

use corvus_search::ExtractedUrl;
use corvus_types::{DomainConfig, ScrapeOptions, ScrapeResult};

fn default_count() -> u32 {
    20
}

fn default_safe_search() -> String {
    "off".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeRequest {
    pub urls: Vec<String>,
    #[serde(default)]
    pub options: ScrapeOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeBatchResponse {
    pub status: &'static str,
    pub execution_time_ms: u64,
    pub results: Vec<ScrapeResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub freshness: Option<String>,
    #[serde(default = "default_safe_search")]
    pub safe_search: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ExtractedUrl>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchAndScrapeRequest {
    pub keywords: Vec<String>,
    #[serde(default = "default_total_results_per_keyword")]
    pub total_results_per_keyword: u32,
    #[serde(default)]
    pub options: ScrapeOptions,
}

fn default_total_results_per_keyword() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResearchRequest {
    pub query: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_effort")]
    pub effort: String,
    #[serde(default)]
    pub freshness: Option<String>,
    #[serde(default = "default_safe_search")]
    pub safe_search: String,
}

fn default_effort() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainConfigListResponse {
    pub domains: Vec<DomainConfig>,
}
