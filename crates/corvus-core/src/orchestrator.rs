//! The scrape/research orchestrator: per-URL lifecycle, bounded
//! concurrency, content-type routing, streaming delivery, and the
//! search-then-scrape research fan-out.
//!
//! Grounded nearly line-for-line on
//! `original_source/app/core/orchestrator.py`'s `ScrapeOrchestrator`
//! (`_scrape_single` stage order, semaphore-bounded fan-out, completion-
//! order streaming, the research effort→cap table). Concurrency is
//! expressed with `futures::StreamExt::buffered`/`buffer_unordered` rather
//! than a hand-rolled semaphore + queue, the same idiom
//! `corvus_fetch::Fetcher::fetch_many` already uses for its bounded
//! fan-out.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{instrument, warn};

use corvus_cache::PageCache;
use corvus_config::DomainConfigStore;
use corvus_fetch::Fetcher;
use corvus_html::{filter_rule_from_parts, parse_document, DomainOverrides, ParsedDocument};
use corvus_search::{extract_urls_from_search_results, BraveSearchClient, SearchParams};
use corvus_types::{
    research_effort_cap, ContentType, FailureReason, ParseResult, ResearchDoneEvent,
    ResearchEvent, ResearchPageEvent, ScrapeOptions, ScrapeResult, ScrapeStatus,
};
use corvus_utils::{validate_and_correct, DomainFilter, URLInfo};

use crate::failure_log;
use crate::pdf::PdfExtractor;
use crate::text_extract::{NullTextExtractor, TextExtractor};

/// Everything `scrape`/`stream_scrape`/`research` need: the fetcher, the
/// two-tier cache, the domain-config snapshot (optional — absent when no
/// database is configured), the ad/tracker filter the HTML parser consults,
/// and the optional search/PDF/OCR collaborators `research` and binary
/// content types depend on.
pub struct Orchestrator {
    fetcher: Arc<Fetcher>,
    cache: Arc<PageCache>,
    domain_filter: Arc<DomainFilter>,
    domain_config: Option<Arc<DomainConfigStore>>,
    search_client: Option<Arc<BraveSearchClient>>,
    pdf_extractor: Option<Arc<PdfExtractor>>,
    ocr: Arc<dyn TextExtractor>,
    failure_pool: Option<sqlx::PgPool>,
    max_scrape_concurrency: usize,
    max_research_concurrency: usize,
}

/// A completed per-URL pipeline run, plus the categorized failure reason
/// when there is one — `scrape`/`stream_scrape` only need the result, but
/// `research`'s page events carry the reason separately (spec.md §4.13).
struct SingleOutcome {
    result: ScrapeResult,
    failure_reason: Option<FailureReason>,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<Fetcher>,
        cache: Arc<PageCache>,
        domain_filter: Arc<DomainFilter>,
        max_scrape_concurrency: usize,
        max_research_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            cache,
            domain_filter,
            domain_config: None,
            search_client: None,
            pdf_extractor: None,
            ocr: Arc::new(NullTextExtractor),
            failure_pool: None,
            max_scrape_concurrency,
            max_research_concurrency,
        }
    }

    pub fn with_domain_config(mut self, store: Arc<DomainConfigStore>) -> Self {
        self.domain_config = Some(store);
        self
    }

    pub fn with_search_client(mut self, client: Arc<BraveSearchClient>) -> Self {
        self.search_client = Some(client);
        self
    }

    pub fn with_pdf_extractor(mut self, extractor: Arc<PdfExtractor>) -> Self {
        self.pdf_extractor = Some(extractor);
        self
    }

    pub fn with_ocr(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.ocr = extractor;
        self
    }

    pub fn with_failure_log(mut self, pool: sqlx::PgPool) -> Self {
        self.failure_pool = Some(pool);
        self
    }

    /// Bounded fan-out over `urls`, returned in the same order as `urls`
    /// (spec.md §5: "`scrape` returns results in the INPUT order").
    pub async fn scrape(&self, urls: &[String], options: ScrapeOptions) -> Vec<ScrapeResult> {
        stream::iter(urls.iter())
            .map(|url| {
                let options = options.clone();
                async move { self.scrape_single(url, &options).await.result }
            })
            .buffered(self.max_scrape_concurrency.max(1))
            .collect()
            .await
    }

    /// Same fan-out as [`Orchestrator::scrape`] but yields results as soon
    /// as each completes (spec.md §5: "`stream_scrape` yields in
    /// COMPLETION order").
    pub fn stream_scrape<'a>(
        &'a self,
        urls: &'a [String],
        options: ScrapeOptions,
    ) -> impl stream::Stream<Item = ScrapeResult> + 'a {
        stream::iter(urls.iter())
            .map(move |url| {
                let options = options.clone();
                async move { self.scrape_single(url, &options).await.result }
            })
            .buffer_unordered(self.max_scrape_concurrency.max(1))
    }

    /// Search the query, scrape the hits (capped by `effort`) under the
    /// research concurrency bound, and stream a `Page` event per completed
    /// URL followed by exactly one `Done` event — even when the search
    /// returns nothing (spec.md §4.13 step 5, §5 "always emitted").
    pub fn research<'a>(
        &'a self,
        query: &'a str,
        country: &'a str,
        effort: &'a str,
        freshness: Option<&'a str>,
        safe_search: &'a str,
    ) -> impl stream::Stream<Item = ResearchEvent> + 'a {
        async_stream::stream! {
            let start = Instant::now();

            let Some(search_client) = &self.search_client else {
                yield ResearchEvent::Done(ResearchDoneEvent {
                    total_urls: 0,
                    scraped: 0,
                    text_content: String::new(),
                    execution_time_ms: elapsed_ms(start),
                });
                return;
            };

            let max_urls = research_effort_cap(effort);
            let mut params = SearchParams::new(query).count(20).country(country).extra_snippets(true);
            params.safe_search = safe_search.to_string();
            if let Some(fresh) = freshness {
                params = params.freshness(fresh);
            }

            let search_results = search_client.search_with_retry(&params, 2).await;
            let url_entries = extract_urls_from_search_results(&[(query.to_string(), search_results)]);
            let urls: Vec<String> = url_entries.into_iter().take(max_urls).map(|e| e.url).collect();
            let total = urls.len();

            let options = ScrapeOptions::for_research();
            let mut scraped = 0usize;
            let mut all_content: Vec<String> = Vec::new();

            let mut outcomes = stream::iter(urls.into_iter())
                .map(|url| {
                    let options = options.clone();
                    async move { self.scrape_single(&url, &options).await }
                })
                .buffer_unordered(self.max_research_concurrency.max(1));

            while let Some(outcome) = outcomes.next().await {
                let content = outcome
                    .result
                    .content
                    .ai_research_content
                    .clone()
                    .or_else(|| outcome.result.content.text_data.clone());

                yield ResearchEvent::Page(ResearchPageEvent {
                    url: outcome.result.url.clone(),
                    title: None,
                    scraped_content: content.clone(),
                    scrape_failure_reason: outcome.failure_reason,
                });

                if let Some(content) = content {
                    scraped += 1;
                    all_content.push(format!("--- {} ---\n{content}", outcome.result.url));
                }
            }

            yield ResearchEvent::Done(ResearchDoneEvent {
                total_urls: total,
                scraped,
                text_content: all_content.join("\n\n"),
                execution_time_ms: elapsed_ms(start),
            });
        }
    }

    #[instrument(skip(self, options), fields(%raw_url))]
    async fn scrape_single(&self, raw_url: &str, options: &ScrapeOptions) -> SingleOutcome {
        let url = match validate_and_correct(raw_url) {
            Ok(url) => url,
            Err(e) => {
                return SingleOutcome {
                    result: ScrapeResult::error(raw_url, e.to_string()),
                    failure_reason: None,
                }
            }
        };

        if let Some(store) = &self.domain_config {
            if !store.is_scrape_allowed(&url) {
                return SingleOutcome {
                    result: ScrapeResult::error(url, "domain scraping not allowed"),
                    failure_reason: None,
                };
            }
        }

        let url_info = match URLInfo::from_url(&url) {
            Ok(info) => info,
            Err(e) => {
                return SingleOutcome {
                    result: ScrapeResult::error(url, e.to_string()),
                    failure_reason: None,
                }
            }
        };

        if options.use_cache {
            if let Some(cached) = self.cache.get(&url_info.unique_page_name).await {
                return SingleOutcome {
                    result: result_from_cache(cached, &url),
                    failure_reason: None,
                };
            }
        }

        let fetch_response = corvus_fetch::fetch_with_retry(&self.fetcher, &url, true).await;

        if fetch_response.failed {
            let primary = fetch_response.failed_primary_reason;
            let failure_summary = format!("{:?}", fetch_response.failed_reasons);
            if let (Some(pool), Some(reason)) = (&self.failure_pool, primary) {
                failure_log::log_failure(
                    pool,
                    &url,
                    reason,
                    Some(fetch_response.status_code),
                    Some(failure_summary.as_str()),
                    fetch_response.proxy_used.as_deref(),
                    None,
                    1,
                )
                .await;
            }

            let mut result = ScrapeResult::error(url, failure_summary);
            result.status_code = Some(fetch_response.status_code);
            result.content_type = Some(fetch_response.content_type);
            result.cms = fetch_response.cms_primary;
            result.firewall = Some(fetch_response.firewall);
            return SingleOutcome { result, failure_reason: primary };
        }

        let result = self
            .process_fetch_response(fetch_response, &url, &url_info, options)
            .await;
        SingleOutcome { result, failure_reason: None }
    }

    async fn process_fetch_response(
        &self,
        resp: corvus_types::fetch::FetchResponse,
        url: &str,
        url_info: &URLInfo,
        options: &ScrapeOptions,
    ) -> ScrapeResult {
        match resp.content_type {
            ContentType::Html => {
                let doc = ParsedDocument::new(&resp.content, url);
                let overrides = self.resolve_overrides(url, &url_info.path);
                match parse_document(&doc, &self.domain_filter, &overrides, options) {
                    Ok(parse_result) => {
                        self.build_result_from_parse(parse_result, &resp, url, url_info, options)
                            .await
                    }
                    Err(e) => {
                        let mut result = ScrapeResult::error(url, e.to_string());
                        result.content_type = Some(ContentType::Html);
                        result.status_code = Some(resp.status_code);
                        result
                    }
                }
            }
            ContentType::Pdf => {
                let bytes = resp
                    .content_bytes
                    .clone()
                    .unwrap_or_else(|| resp.content.clone().into_bytes());
                let text = self.extract_pdf_text(&bytes);
                self.build_text_result(text, &resp, url, url_info, options).await
            }
            ContentType::Image => {
                let text = resp
                    .content_bytes
                    .as_deref()
                    .and_then(|bytes| self.extract_image_text(bytes));
                self.build_text_result(text, &resp, url, url_info, options).await
            }
            ContentType::Json | ContentType::Xml | ContentType::Markdown | ContentType::PlainText => {
                let text = crate::content::extract_text_content(&resp.content, resp.content_type);
                self.build_text_result(text, &resp, url, url_info, options).await
            }
            other => {
                let mut result =
                    ScrapeResult::error(url, format!("unsupported content type: {other:?}"));
                result.content_type = Some(other);
                result.status_code = Some(resp.status_code);
                result
            }
        }
    }

    fn resolve_overrides(&self, url: &str, path: &str) -> DomainOverrides {
        let Some(store) = &self.domain_config else {
            return DomainOverrides::default();
        };
        let resolved = store.overrides_for_path(url, path);
        DomainOverrides {
            content_filter: resolved
                .content_filter
                .iter()
                .map(|o| filter_rule_from_parts(&o.selector_type, o.match_type, o.values.clone()))
                .collect(),
            main_content: resolved
                .main_content
                .iter()
                .map(|o| filter_rule_from_parts(&o.selector_type, o.match_type, o.values.clone()))
                .collect(),
        }
    }

    fn extract_pdf_text(&self, bytes: &[u8]) -> Option<String> {
        let extractor = self.pdf_extractor.as_ref()?;
        match extractor.extract_text(bytes, self.ocr.as_ref()) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "pdf text extraction failed");
                None
            }
        }
    }

    fn extract_image_text(&self, bytes: &[u8]) -> Option<String> {
        let decoded = match image::load_from_memory(bytes) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "failed to decode image for ocr");
                return None;
            }
        };
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        match self.ocr.extract_text(rgba.as_raw(), width, height) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "image ocr failed");
                None
            }
        }
    }

    async fn build_result_from_parse(
        &self,
        parse_result: ParseResult,
        resp: &corvus_types::fetch::FetchResponse,
        url: &str,
        url_info: &URLInfo,
        options: &ScrapeOptions,
    ) -> ScrapeResult {
        let text_data = parse_result
            .text_data
            .clone()
            .or_else(|| parse_result.ai_research_content.clone())
            .unwrap_or_default();

        if options.use_cache {
            self.store_cache_entry(
                url_info,
                url,
                &parse_result_cache_json(&parse_result),
                ContentType::Html.as_wire(),
                text_data.chars().count() as i64,
                options.cache_ttl_days,
            )
            .await;
        }

        let mut result = ScrapeResult::success(url, ContentType::Html);
        result.status_code = Some(resp.status_code);
        result.cms = resp.cms_primary;
        result.firewall = Some(resp.firewall);
        result.content = parse_result;
        result
    }

    async fn build_text_result(
        &self,
        text: Option<String>,
        resp: &corvus_types::fetch::FetchResponse,
        url: &str,
        url_info: &URLInfo,
        options: &ScrapeOptions,
    ) -> ScrapeResult {
        let Some(text) = text.filter(|t| !t.is_empty()) else {
            let mut result = ScrapeResult::error(url, "no extractable text content");
            result.content_type = Some(resp.content_type);
            result.status_code = Some(resp.status_code);
            return result;
        };

        if options.use_cache {
            let cache_json = serde_json::json!({
                "text_data": text,
                "ai_research_content": text,
            });
            self.store_cache_entry(
                url_info,
                url,
                &cache_json,
                resp.content_type.as_wire(),
                text.chars().count() as i64,
                options.cache_ttl_days,
            )
            .await;
        }

        let mut result = ScrapeResult::success(url, resp.content_type);
        result.status_code = Some(resp.status_code);
        result.content.text_data = Some(text.clone());
        result.content.ai_research_content = Some(text);
        result
    }

    async fn store_cache_entry(
        &self,
        url_info: &URLInfo,
        url: &str,
        content: &serde_json::Value,
        content_type: &str,
        char_count: i64,
        ttl_days: u16,
    ) {
        if let Err(e) = self
            .cache
            .set(
                &url_info.unique_page_name,
                url,
                &url_info.full_domain,
                content.clone(),
                content_type,
                char_count,
                ttl_days as i64,
            )
            .await
        {
            warn!(error = %e, "failed to write page cache entry");
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Only the fields worth caching, matching the source's `cache_content`
/// dict build in `_build_result_from_parse` (skips organized_data and
/// content_filter_removal_details — large, and cheap to recompute).
fn parse_result_cache_json(parse_result: &ParseResult) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    if let Some(v) = &parse_result.text_data {
        map.insert("text_data".to_string(), serde_json::json!(v));
    }
    if let Some(v) = &parse_result.ai_research_content {
        map.insert("ai_research_content".to_string(), serde_json::json!(v));
    }
    if let Some(v) = &parse_result.overview {
        map.insert(
            "overview".to_string(),
            serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
        );
    }
    if let Some(v) = &parse_result.main_image {
        map.insert("main_image".to_string(), serde_json::json!(v));
    }
    if !parse_result.hashes.is_empty() {
        map.insert(
            "hashes".to_string(),
            serde_json::to_value(&parse_result.hashes).unwrap_or(serde_json::Value::Null),
        );
    }
    if !parse_result.links.is_empty() {
        map.insert(
            "links".to_string(),
            serde_json::to_value(&parse_result.links).unwrap_or(serde_json::Value::Null),
        );
    }
    serde_json::Value::Object(map)
}

fn result_from_cache(cached: corvus_cache::CachedPage, url: &str) -> ScrapeResult {
    let content: ParseResult = serde_json::from_value(cached.content).unwrap_or_default();
    ScrapeResult {
        status: ScrapeStatus::Success,
        url: url.to_string(),
        scraped_at: cached.scraped_at,
        from_cache: true,
        content_type: ContentType::from_wire(&cached.content_type),
        status_code: None,
        cms: None,
        firewall: None,
        error: None,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_orchestrator() -> Orchestrator {
        let fetcher = Arc::new(Fetcher::new(vec![], vec![]));
        let cache = Arc::new(PageCache::memory_only(100, 1800));
        let domain_filter = Arc::new(DomainFilter::empty());
        Orchestrator::new(fetcher, cache, domain_filter, 5, 2)
    }

    #[tokio::test]
    async fn invalid_url_is_a_typed_error_result() {
        let orch = test_orchestrator();
        let outcome = orch.scrape_single("not a url at all", &ScrapeOptions::default()).await;
        assert_eq!(outcome.result.status, ScrapeStatus::Error);
        assert!(outcome.result.error.is_some());
    }

    #[tokio::test]
    async fn loopback_url_is_rejected() {
        let orch = test_orchestrator();
        let outcome = orch
            .scrape_single("http://127.0.0.1/admin", &ScrapeOptions::default())
            .await;
        assert_eq!(outcome.result.status, ScrapeStatus::Error);
    }

    #[tokio::test]
    async fn scrape_preserves_input_order() {
        let orch = test_orchestrator();
        let urls = vec!["not a url".to_string(), "also not a url".to_string()];
        let results = orch.scrape(&urls, ScrapeOptions::default()).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, urls[0]);
        assert_eq!(results[1].url, urls[1]);
    }

    #[tokio::test]
    async fn research_without_search_client_still_emits_done() {
        let orch = test_orchestrator();
        let events: Vec<ResearchEvent> = orch
            .research("rust web scraping", "us", "low", None, "off")
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ResearchEvent::Done(_)));
    }
}
