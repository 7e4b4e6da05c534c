//! Brave Search HTTP client: rate-limited, retrying, and tolerant of the
//! provider's own rate limiting — every failure mode the source treats as
//! "try again later" comes back as `None` rather than an error, since a
//! failed search leg shouldn't abort a whole research run.
//!
//! Grounded on `original_source/app/core/search.py`'s `BraveSearchClient`.

use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::rate_limit::RateLimiter;
use crate::types::{BraveSearchResponse, SearchParams};

const BRAVE_BASE_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const MIN_INTERVAL: Duration = Duration::from_millis(1300);

pub struct BraveSearchClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_key_ai: Option<String>,
    rate_limiter: RateLimiter,
}

impl BraveSearchClient {
    pub fn new(api_key: Option<String>, api_key_ai: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            api_key_ai,
            rate_limiter: RateLimiter::new(MIN_INTERVAL),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key_for(&self, use_ai_plan: bool) -> Option<&str> {
        if use_ai_plan {
            self.api_key_ai.as_deref().or(self.api_key.as_deref())
        } else {
            self.api_key.as_deref()
        }
    }

    /// A single search attempt. Returns `None` (with a logged warning) on
    /// a missing key, a 429, a timeout, or any other request failure —
    /// never propagates an error, matching the source's blanket
    /// `except Exception: return None`.
    #[instrument(skip(self, params), fields(query = %params.query))]
    pub async fn search(&self, params: &SearchParams) -> Option<BraveSearchResponse> {
        let Some(api_key) = self.api_key_for(params.extra_snippets) else {
            warn!("brave search api key not configured");
            return None;
        };

        self.rate_limiter.acquire().await;

        let mut query_pairs = vec![
            ("q".to_string(), params.query.clone()),
            ("count".to_string(), params.count.min(20).to_string()),
            ("offset".to_string(), params.offset.to_string()),
            ("country".to_string(), params.country.clone()),
            ("extra_snippets".to_string(), params.extra_snippets.to_string()),
            ("text_decorations".to_string(), "false".to_string()),
            ("safesearch".to_string(), params.safe_search.clone()),
        ];
        if let Some(freshness) = &params.freshness {
            query_pairs.push(("freshness".to_string(), freshness.to_lowercase()));
        }

        let request = self
            .http
            .get(BRAVE_BASE_URL)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .header("User-Agent", "corvus/1.0")
            .query(&query_pairs)
            .timeout(Duration::from_secs(params.timeout_seconds));

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                warn!(query = %params.query, "brave search timed out");
                return None;
            }
            Err(e) => {
                warn!(query = %params.query, error = %e, "brave search request failed");
                return None;
            }
        };

        if response.status().as_u16() == 429 {
            warn!(query = %params.query, "brave search rate limited");
            return None;
        }
        if !response.status().is_success() {
            warn!(query = %params.query, status = %response.status(), "brave search returned error status");
            return None;
        }

        match response.json::<BraveSearchResponse>().await {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(query = %params.query, error = %e, "failed to parse brave search response");
                None
            }
        }
    }

    /// Retries up to `max_retries` times with the source's
    /// `3 + attempt*2 + jitter(0..1)` backoff.
    #[instrument(skip(self, params), fields(query = %params.query))]
    pub async fn search_with_retry(
        &self,
        params: &SearchParams,
        max_retries: u32,
    ) -> Option<BraveSearchResponse> {
        for attempt in 0..=max_retries {
            if let Some(result) = self.search(params).await {
                return Some(result);
            }
            if attempt < max_retries {
                let delay = 3.0 + (attempt as f64 * 2.0) + fastrand::f64();
                info!(query = %params.query, attempt = attempt + 1, max_retries, delay, "retrying brave search");
                tokio::time::sleep(Duration::from_secs_f64(delay)).await;
            }
        }
        None
    }

    /// Runs `search_with_retry` for each query in turn; sequential because
    /// the shared rate limiter already serializes requests across calls.
    pub async fn multi_search(
        &self,
        queries: &[String],
        template: &SearchParams,
        max_retries: u32,
    ) -> Vec<(String, Option<BraveSearchResponse>)> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let params = SearchParams { query: query.clone(), ..template.clone() };
            let result = self.search_with_retry(&params, max_retries).await;
            results.push((query.clone(), result));
        }
        results
    }
}

impl std::fmt::Debug for BraveSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraveSearchClient")
            .field("configured", &self.is_configured())
            .finish()
    }
}
