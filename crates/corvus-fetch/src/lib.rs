//! The fetcher: strategy selection, proxy rotation, retry ladder, content
//! classification, and block/firewall detection.
//!
//! Grounded almost line-for-line on
//! `original_source/app/core/fetcher/fetcher.py` (`UnifiedFetcher`), with
//! the same content-type branch order, retry-trigger selector table, and
//! CMS/date resolution. `curl_cffi`'s TLS-impersonating session has no
//! direct Rust equivalent in this corpus, so the "normal + impersonating"
//! strategy is a `reqwest::Client` built with a rotated browser-like header
//! profile instead of a TLS fingerprint — the header-profile rotation is
//! the part of that strategy spec.md actually requires (§4.9: "rotates a
//! browser-like fingerprint and header profile").

pub mod classify;
pub mod profiles;
pub mod proxy;
pub mod retry;

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use corvus_browser::BrowserPool;
use corvus_types::{ContentType, FailureReason, Firewall, RequestType};
use corvus_types::fetch::FetchResponse;
use tracing::{instrument, warn};

pub use proxy::ProxyRotator;
pub use retry::fetch_with_retry;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const BROWSER_TIMEOUT: Duration = Duration::from_secs(30);
const BROWSER_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// CSS-selector-equivalent substring markers the source looks for with
/// `selectolax` CSS selectors; `scraper` is used here instead since it's
/// already a workspace dependency and these are simple attribute/text
/// probes, not full selector matching.
struct RetrySelector {
    selector: &'static str,
    is_cloudflare: bool,
}

const RETRY_SELECTORS: &[RetrySelector] = &[
    RetrySelector {
        selector: r#"#turnstile-wrapper iframe[src^="https://challenges.cloudflare.com"]"#,
        is_cloudflare: true,
    },
    RetrySelector {
        selector: r#"div#infoDiv0 a[href*="//www.google.com/policies/terms/"]"#,
        is_cloudflare: false,
    },
    RetrySelector {
        selector: r#"iframe[src*="_Incapsula_Resource"]"#,
        is_cloudflare: false,
    },
];

/// Error substrings that indicate the *proxy*, not the origin, is the
/// problem; `fetch_with_retry`'s ladder treats these as worth a different
/// proxy rather than giving up.
const ROTATE_PROXY_ERRORS: &[&str] = &[
    "ECONNRESET",
    "ECONNREFUSED",
    "ERR_PROXY_CONNECTION_FAILED",
    "ERR_TUNNEL_CONNECTION_FAILED",
    "Proxy responded with",
    "unsuccessful tunnel",
    "TunnelUnsuccessful",
];

/// Everything a fetch needs beyond the URL: proxy pool, header-profile
/// rotation, and (optionally) a browser pool for `RequestType::Browser`.
pub struct Fetcher {
    client: reqwest::Client,
    plain_client: reqwest::Client,
    proxy_rotator: ProxyRotator,
    browser_pool: Option<std::sync::Arc<BrowserPool>>,
}

impl Fetcher {
    pub fn new(datacenter_proxies: Vec<String>, residential_proxies: Vec<String>) -> Self {
        Self {
            client: build_client(true),
            plain_client: build_client(false),
            proxy_rotator: ProxyRotator::new(datacenter_proxies, residential_proxies),
            browser_pool: None,
        }
    }

    pub fn with_browser_pool(mut self, pool: std::sync::Arc<BrowserPool>) -> Self {
        self.browser_pool = Some(pool);
        self
    }

    pub fn proxy_rotator(&self) -> &ProxyRotator {
        &self.proxy_rotator
    }

    /// One fetch attempt with header-profile impersonation on (the default
    /// transport for `RequestType::Normal`).
    pub async fn fetch(
        &self,
        url: &str,
        request_type: RequestType,
        proxy: Option<&str>,
    ) -> FetchResponse {
        self.fetch_with_strategy(url, request_type, proxy, true).await
    }

    /// Same as [`Fetcher::fetch`] but lets the caller opt out of the rotated
    /// header profile, matching `fetch`'s `use_curl_cffi` parameter.
    #[instrument(skip(self), fields(%url, ?request_type, proxy_used = proxy.is_some()))]
    pub async fn fetch_with_strategy(
        &self,
        url: &str,
        request_type: RequestType,
        proxy: Option<&str>,
        impersonate: bool,
    ) -> FetchResponse {
        let mut response = FetchResponse {
            request_url: url.to_string(),
            response_url: url.to_string(),
            request_type,
            content_type: ContentType::Other,
            extension: None,
            other_extensions: Vec::new(),
            raw_content_type_header: None,
            status_code: 500,
            response_headers: HashMap::new(),
            content: String::new(),
            content_bytes: None,
            title: None,
            proxy_used: proxy.map(|p| p.to_string()),
            failed: false,
            failed_primary_reason: None,
            failed_reasons: Vec::new(),
            published_at: None,
            modified_at: None,
            cms_primary: None,
            cms_other: Vec::new(),
            firewall: Firewall::None,
        };

        let url_hint = classify::content_type_from_url_extension(url);
        let is_likely_binary = url_hint.map(|h| h.is_binary()).unwrap_or(false);

        match request_type {
            RequestType::Browser => {
                self.fetch_via_browser(url, proxy, &mut response).await;
            }
            RequestType::Normal => {
                self.fetch_via_http(url, proxy, is_likely_binary, impersonate, &mut response)
                    .await;
            }
        }

        classify::classify_and_inspect(&mut response, url_hint);
        response
    }

    async fn fetch_via_browser(&self, url: &str, _proxy: Option<&str>, response: &mut FetchResponse) {
        let Some(pool) = &self.browser_pool else {
            response.add_failure(
                FailureReason::RequestError,
                "browser pool not available for browser fetch".to_string(),
            );
            return;
        };
        match pool.fetch(url, BROWSER_TIMEOUT, BROWSER_ACQUIRE_TIMEOUT).await {
            Ok(outcome) => {
                response.content = outcome.content;
                response.response_url = outcome.response_url;
                response.status_code = outcome.status_code;
                response.response_headers = outcome.headers;
                response.title = outcome.title;
                response.raw_content_type_header =
                    response.response_headers.get("content-type").cloned();
            }
            Err(e) => {
                warn!(error = %e, "browser fetch failed");
                response.add_failure(FailureReason::RequestError, e.to_string());
            }
        }
    }

    async fn fetch_via_http(
        &self,
        url: &str,
        proxy: Option<&str>,
        is_likely_binary: bool,
        impersonate: bool,
        response: &mut FetchResponse,
    ) {
        let client = if let Some(proxy_url) = proxy {
            match build_proxied_client(proxy_url, impersonate) {
                Ok(c) => c,
                Err(e) => {
                    response.add_failure(FailureReason::ProxyError, e.to_string());
                    return;
                }
            }
        } else if impersonate {
            self.client.clone()
        } else {
            self.plain_client.clone()
        };

        let mut request = client.get(url);
        if impersonate {
            let profile = profiles::random_profile();
            for (k, v) in &profile.headers {
                request = request.header(*k, *v);
            }
        }

        match request.timeout(DEFAULT_TIMEOUT).send().await {
            Ok(resp) => {
                response.status_code = resp.status().as_u16();
                response.response_url = resp.url().to_string();
                response.response_headers = resp
                    .headers()
                    .iter()
                    .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
                    .collect();
                response.raw_content_type_header =
                    response.response_headers.get("content-type").cloned();

                let content_type_lower = response
                    .raw_content_type_header
                    .as_deref()
                    .unwrap_or("")
                    .to_lowercase();
                let is_binary_response = is_likely_binary
                    || content_type_lower.contains("application/pdf")
                    || content_type_lower.starts_with("image/");

                match resp.bytes().await {
                    Ok(bytes) => {
                        if is_binary_response {
                            response.content_bytes = Some(bytes.to_vec());
                        } else {
                            response.content = String::from_utf8_lossy(&bytes).into_owned();
                        }
                    }
                    Err(e) => {
                        response.add_failure(FailureReason::RequestError, e.to_string());
                    }
                }
            }
            Err(e) => {
                let message = e.to_string();
                response.add_failure(FailureReason::RequestError, message.clone());
                if ROTATE_PROXY_ERRORS.iter().any(|marker| message.contains(marker)) {
                    response.add_failure(FailureReason::ProxyError, message);
                }
            }
        }
    }

    /// Bounded fan-out over `urls`, matching `fetch_many`'s
    /// `asyncio.Semaphore`-bounded gather.
    pub async fn fetch_many(
        &self,
        urls: &[String],
        max_concurrency: usize,
        use_random_proxy: bool,
    ) -> Vec<FetchResponse> {
        use futures::stream::{self, StreamExt};

        stream::iter(urls.iter().cloned())
            .map(|url| async move { fetch_with_retry(self, &url, use_random_proxy).await })
            .buffered(max_concurrency.max(1))
            .collect()
            .await
    }
}

fn build_client(impersonate: bool) -> reqwest::Client {
    let builder = reqwest::Client::builder()
        .gzip(true)
        .brotli(true)
        .connect_timeout(Duration::from_secs(5))
        .timeout(DEFAULT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10));
    let builder = if impersonate {
        builder.user_agent(profiles::DEFAULT_USER_AGENT)
    } else {
        builder.user_agent("corvus-fetch/0.1")
    };
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}

fn build_proxied_client(proxy_url: &str, impersonate: bool) -> anyhow::Result<reqwest::Client> {
    let proxy = reqwest::Proxy::all(proxy_url)?;
    let user_agent = if impersonate {
        profiles::DEFAULT_USER_AGENT
    } else {
        "corvus-fetch/0.1"
    };
    Ok(reqwest::Client::builder()
        .proxy(proxy)
        .gzip(true)
        .brotli(true)
        .connect_timeout(Duration::from_secs(5))
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(user_agent)
        .build()?)
}

pub(crate) fn to_iso(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc2822(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

pub(crate) fn retry_selectors() -> &'static [RetrySelector] {
    RETRY_SELECTORS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_impersonating_and_plain_clients() {
        let fetcher = Fetcher::new(vec!["http://proxy.example:8080".into()], vec![]);
        assert!(fetcher.proxy_rotator().random().is_some());
    }

    #[tokio::test]
    async fn browser_request_without_pool_fails_cleanly() {
        let fetcher = Fetcher::new(vec![], vec![]);
        let response = fetcher
            .fetch("https://example.com", RequestType::Browser, None)
            .await;
        assert!(response.failed);
        assert_eq!(
            response.failed_primary_reason,
            Some(FailureReason::RequestError)
        );
    }
}
