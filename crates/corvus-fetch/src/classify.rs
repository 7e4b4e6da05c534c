//! Content-type classification, title/meta extraction, block/firewall
//! detection, CMS fingerprinting, and publish/modified date resolution —
//! everything `fetcher.py` does to a raw response after the bytes are in
//! hand, in the same branch order.

use std::collections::HashMap;

use corvus_types::fetch::FetchResponse;
use corvus_types::{CmsKind, ContentType, FailureReason, Firewall};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::{retry_selectors, to_iso};

/// HTML fences the source checks for when the declared content-type is
/// ambiguous: the usual `<html`/`<!doctype html` markers, loosely matched.
static HTML_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype\s+html|<html[\s>]").unwrap());

static WORDPRESS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)wp-content|wp-includes"#).unwrap());

static SHOPIFY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)cdn\.shopify\.com|Shopify\.theme"#).unwrap());

const LOW_TEXT_THRESHOLD: usize = 100;

/// A guess at content type from the URL's path extension alone, used before
/// any bytes are fetched (so the fetcher knows whether to expect binary).
pub fn content_type_from_url_extension(url: &str) -> Option<ContentType> {
    let ext = Url::parse(url)
        .ok()?
        .path_segments()?
        .next_back()?
        .rsplit('.')
        .next()?
        .to_lowercase();
    ContentType::from_url_extension(&ext)
}

/// Runs every post-fetch inspection pass: content-type resolution, title/
/// meta extraction, failure/firewall detection, CMS fingerprint, and dates.
/// Mutates `response` in place; called once per fetch attempt regardless of
/// transport.
pub fn classify_and_inspect(response: &mut FetchResponse, url_hint: Option<ContentType>) {
    resolve_content_type(response, url_hint);
    resolve_extension(response);

    if response.status_code >= 400 {
        response.add_failure(
            FailureReason::BadStatus,
            format!("status code {}", response.status_code),
        );
    }

    if response.content_type == ContentType::Html && !response.content.is_empty() {
        inspect_html(response);
    } else if !response.content_type.is_extractable() {
        response.add_failure(
            FailureReason::NonHtmlContent,
            format!("content type {:?} is not extractable", response.content_type),
        );
    }

    response.recompute_failed();
}

fn resolve_content_type(response: &mut FetchResponse, url_hint: Option<ContentType>) {
    let header = response
        .raw_content_type_header
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    response.content_type = if header.contains("text/html") {
        ContentType::Html
    } else if header.contains("text/markdown") {
        ContentType::Markdown
    } else if header.contains("application/pdf") {
        ContentType::Pdf
    } else if header.contains("application/json") {
        ContentType::Json
    } else if header.contains("xml") {
        ContentType::Xml
    } else if header.contains("text/plain") {
        ContentType::PlainText
    } else if header.starts_with("image/") || header.contains("image/") {
        ContentType::Image
    } else if response
        .content_bytes
        .as_deref()
        .map(|b| b.starts_with(b"%PDF-"))
        .unwrap_or(false)
    {
        ContentType::Pdf
    } else if HTML_MARKER.is_match(&response.content) {
        ContentType::Html
    } else if let Some(hint) = url_hint {
        hint
    } else {
        ContentType::Other
    };
}

fn resolve_extension(response: &mut FetchResponse) {
    response.extension = response.content_type.default_extension().map(String::from);

    if let Ok(parsed) = Url::parse(&response.response_url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if let Some(ext) = last.rsplit_once('.').map(|(_, e)| e.to_lowercase()) {
                    if Some(ext.as_str()) != response.extension.as_deref() && !ext.is_empty() {
                        response.other_extensions.push(ext);
                    }
                }
            }
        }
    }
}

fn inspect_html(response: &mut FetchResponse) {
    let document = Html::parse_document(&response.content);

    extract_title(&document, response);
    extract_meta(&document, response);
    detect_block(&document, response);
    detect_firewall(response);
    detect_cms(&document, response);

    let text_len = document.root_element().text().collect::<String>().trim().len();
    if text_len < LOW_TEXT_THRESHOLD {
        response.add_failure(
            FailureReason::LowTextContent,
            format!("extracted text is only {text_len} characters"),
        );
    }
}

fn extract_title(document: &Html, response: &mut FetchResponse) {
    if let Ok(sel) = Selector::parse("title") {
        if let Some(el) = document.select(&sel).next() {
            let title = el.text().collect::<String>().trim().to_string();
            if !title.is_empty() {
                response.title = Some(title);
            }
        }
    }
}

fn meta_content(document: &Html, cache: &mut HashMap<String, String>, names: &[&str]) -> Option<String> {
    for name in names {
        if let Some(v) = cache.get(*name) {
            return Some(v.clone());
        }
    }
    let Ok(sel) = Selector::parse("meta") else {
        return None;
    };
    for el in document.select(&sel) {
        let key = el
            .value()
            .attr("property")
            .or_else(|| el.value().attr("name"))
            .unwrap_or("")
            .to_lowercase();
        if let Some(content) = el.value().attr("content") {
            cache.entry(key).or_insert_with(|| content.to_string());
        }
    }
    names.iter().find_map(|n| cache.get(*n)).cloned()
}

fn extract_meta(document: &Html, response: &mut FetchResponse) {
    let mut cache = HashMap::new();
    let published = meta_content(
        document,
        &mut cache,
        &["article:published_time", "og:article:published_time", "datepublished", "date"],
    );
    let modified = meta_content(
        document,
        &mut cache,
        &["article:modified_time", "og:article:modified_time", "datemodified", "last-modified"],
    );

    response.published_at = published
        .as_deref()
        .and_then(to_iso)
        .or_else(|| json_ld_date(document, &["datePublished"]));
    response.modified_at = modified
        .as_deref()
        .and_then(to_iso)
        .or_else(|| json_ld_date(document, &["dateModified"]));
}

fn json_ld_date(document: &Html, keys: &[&str]) -> Option<chrono::DateTime<chrono::Utc>> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for el in document.select(&sel) {
        let raw = el.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) else {
            continue;
        };
        if let Some(found) = find_json_ld_date(&value, keys) {
            return to_iso(Some(&found));
        }
    }
    None
}

fn find_json_ld_date(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            for key in keys {
                if let Some(v) = map.get(*key).and_then(|v| v.as_str()) {
                    return Some(v.to_string());
                }
            }
            if let Some(graph) = map.get("@graph").and_then(|v| v.as_array()) {
                for node in graph {
                    if let Some(found) = find_json_ld_date(node, keys) {
                        return Some(found);
                    }
                }
            }
            None
        }
        serde_json::Value::Array(items) => {
            items.iter().find_map(|v| find_json_ld_date(v, keys))
        }
        _ => None,
    }
}

fn detect_block(document: &Html, response: &mut FetchResponse) {
    let mut matched_cloudflare = false;
    for selector in retry_selectors() {
        if let Ok(sel) = Selector::parse(selector.selector) {
            if document.select(&sel).next().is_some() {
                if selector.is_cloudflare {
                    matched_cloudflare = true;
                }
                response.add_failure(
                    if selector.is_cloudflare {
                        FailureReason::CloudflareBlock
                    } else {
                        FailureReason::Blocked
                    },
                    format!("blocked selector matched: {}", selector.selector),
                );
            }
        }
    }

    if let Some(title) = &response.title {
        let lowered = title.to_lowercase();
        if lowered.contains("just a moment") || lowered.contains("attention required") {
            matched_cloudflare = true;
            response.add_failure(FailureReason::CloudflareBlock, format!("title: {title}"));
        }
    }

    if matched_cloudflare {
        response.firewall = Firewall::Cloudflare;
    }
}

fn detect_firewall(response: &mut FetchResponse) {
    if response.firewall != Firewall::None {
        return;
    }
    let headers = &response.response_headers;
    let has = |k: &str| headers.keys().any(|h| h.eq_ignore_ascii_case(k));
    let starts_with = |prefix: &str| headers.keys().any(|h| h.to_lowercase().starts_with(prefix));

    response.firewall = if has("cf-ray")
        || headers
            .get("server")
            .map(|s| s.to_lowercase().contains("cloudflare"))
            .unwrap_or(false)
    {
        Firewall::Cloudflare
    } else if has("x-amzn-requestid")
        && headers
            .get("server")
            .map(|s| s.to_lowercase().contains("awselb") || s.to_lowercase().contains("aws"))
            .unwrap_or(false)
    {
        Firewall::AwsWaf
    } else if starts_with("x-datadome") {
        Firewall::Datadome
    } else {
        Firewall::None
    };
}

fn detect_cms(document: &Html, response: &mut FetchResponse) {
    let mut detected = Vec::new();

    if let Ok(sel) = Selector::parse(r#"meta[name="generator"]"#) {
        if let Some(el) = document.select(&sel).next() {
            if let Some(content) = el.value().attr("content") {
                let lowered = content.to_lowercase();
                if lowered.contains("wordpress") {
                    detected.push(CmsKind::Wordpress);
                } else if lowered.contains("shopify") {
                    detected.push(CmsKind::Shopify);
                }
            }
        }
    }

    if WORDPRESS_MARKER.is_match(&response.content) && !detected.contains(&CmsKind::Wordpress) {
        detected.push(CmsKind::Wordpress);
    }
    if SHOPIFY_MARKER.is_match(&response.content) && !detected.contains(&CmsKind::Shopify) {
        detected.push(CmsKind::Shopify);
    }

    if let Ok(sel) = Selector::parse(r#"link[href*="cdn.shopify.com"]"#) {
        if document.select(&sel).next().is_some() && !detected.contains(&CmsKind::Shopify) {
            detected.push(CmsKind::Shopify);
        }
    }

    if detected.is_empty() {
        response.cms_primary = Some(CmsKind::Unknown);
    } else {
        response.cms_primary = Some(detected[0]);
        response.cms_other = detected[1..]
            .iter()
            .map(|c| format!("{c:?}").to_lowercase())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_extension_hints_pdf() {
        assert_eq!(
            content_type_from_url_extension("https://example.com/a/file.PDF"),
            Some(ContentType::Pdf)
        );
    }

    #[test]
    fn html_marker_detects_bare_markup() {
        assert!(HTML_MARKER.is_match("<!doctype html><html><body>hi</body></html>"));
        assert!(!HTML_MARKER.is_match("{\"a\": 1}"));
    }

    #[test]
    fn classify_resolves_json_header() {
        let mut response = FetchResponse {
            request_url: "https://example.com/a.json".into(),
            response_url: "https://example.com/a.json".into(),
            request_type: corvus_types::RequestType::Normal,
            content_type: ContentType::Other,
            extension: None,
            other_extensions: Vec::new(),
            raw_content_type_header: Some("application/json; charset=utf-8".into()),
            status_code: 200,
            response_headers: HashMap::new(),
            content: "{}".into(),
            content_bytes: None,
            title: None,
            proxy_used: None,
            failed: false,
            failed_primary_reason: None,
            failed_reasons: Vec::new(),
            published_at: None,
            modified_at: None,
            cms_primary: None,
            cms_other: Vec::new(),
            firewall: Firewall::None,
        };
        classify_and_inspect(&mut response, None);
        assert_eq!(response.content_type, ContentType::Json);
        assert!(!response.failed);
    }

    #[test]
    fn low_text_html_is_flagged() {
        let mut response = FetchResponse {
            request_url: "https://example.com".into(),
            response_url: "https://example.com".into(),
            request_type: corvus_types::RequestType::Normal,
            content_type: ContentType::Other,
            extension: None,
            other_extensions: Vec::new(),
            raw_content_type_header: Some("text/html".into()),
            status_code: 200,
            response_headers: HashMap::new(),
            content: "<html><body><p>hi</p></body></html>".into(),
            content_bytes: None,
            title: None,
            proxy_used: None,
            failed: false,
            failed_primary_reason: None,
            failed_reasons: Vec::new(),
            published_at: None,
            modified_at: None,
            cms_primary: None,
            cms_other: Vec::new(),
            firewall: Firewall::None,
        };
        classify_and_inspect(&mut response, None);
        assert!(response.failed);
        assert!(response
            .failed_reasons
            .iter()
            .any(|r| r.kind == FailureReason::LowTextContent));
    }
}
