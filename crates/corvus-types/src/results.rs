//! Public result shapes: what `scrape`/`stream_scrape`/`research` hand back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::{ContentNode, OrganizedData};
use crate::enums::{CmsKind, ContentType, FailureReason, Firewall};

/// Summary block surfaced when `options.get_overview` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub site: String,
    pub page_title: Option<String>,
    pub char_count: usize,
    pub table_count: usize,
    pub list_count: usize,
    pub code_block_count: usize,
    pub has_structured_content: bool,
}

/// The full output of one parser façade call, before the per-call options
/// select a subset for the public `ScrapeResult`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResult {
    pub overview: Option<Overview>,
    pub organized_data: Option<OrganizedData>,
    pub text_data: Option<String>,
    pub ai_research_content: Option<String>,
    pub main_image: Option<String>,
    #[serde(default)]
    pub hashes: HashMap<String, String>,
    #[serde(default)]
    pub links: Vec<String>,
    pub content_filter_removal_details: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Error,
}

/// The public, per-URL response shape returned by `scrape`/`stream_scrape`
/// and embedded in the HTTP API's batch/SSE responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub status: ScrapeStatus,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    pub from_cache: bool,
    pub content_type: Option<ContentType>,
    pub status_code: Option<u16>,
    pub cms: Option<CmsKind>,
    pub firewall: Option<Firewall>,
    pub error: Option<String>,

    #[serde(flatten)]
    pub content: ParseResult,
}

impl ScrapeResult {
    pub fn error(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ScrapeStatus::Error,
            url: url.into(),
            scraped_at: Utc::now(),
            from_cache: false,
            content_type: None,
            status_code: None,
            cms: None,
            firewall: None,
            error: Some(message.into()),
            content: ParseResult::default(),
        }
    }

    pub fn success(url: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            status: ScrapeStatus::Success,
            url: url.into(),
            scraped_at: Utc::now(),
            from_cache: false,
            content_type: Some(content_type),
            status_code: None,
            cms: None,
            firewall: None,
            error: None,
            content: ParseResult::default(),
        }
    }
}

/// One emitted event per completed page in a `research` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPageEvent {
    pub url: String,
    pub title: Option<String>,
    pub scraped_content: Option<String>,
    pub scrape_failure_reason: Option<FailureReason>,
}

/// The single closing event of a `research` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchDoneEvent {
    pub total_urls: usize,
    pub scraped: usize,
    pub text_content: String,
    pub execution_time_ms: u64,
}

/// One item of `Orchestrator::research`'s event stream: zero or more
/// per-page events followed by exactly one closing `Done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ResearchEvent {
    Page(ResearchPageEvent),
    Done(ResearchDoneEvent),
}

/// An individual node surfaced for round-trip/debug inspection; not part of
/// the public wire shape but useful when testing the projector directly.
pub type Node = ContentNode;
