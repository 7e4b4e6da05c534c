//! Canonicalization, validation, joining, and path-pattern matching.
//!
//! Grounded directly on `scraper-service/app/utils/url.py`: the
//! clean/construct-path/validate/join/match_path algorithms here are
//! line-for-line ports, using `url::Url` in place of `urllib.parse`.

use std::net::IpAddr;

use corvus_types::{CorvusError, CorvusResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// A small registry of per-host URL rewrites, generalizing the source's
/// single Google-Docs-only `rules` dict so more sites can be added without
/// touching `validate_and_correct`'s canonicalization logic.
type RewriteRule = fn(&Url) -> Option<Url>;

static SITE_REWRITES: &[(&str, RewriteRule)] = &[("docs.google.com", google_docs_mobilebasic)];

fn google_docs_mobilebasic(url: &Url) -> Option<Url> {
    let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
    if segments.len() >= 3 && segments[0] == "document" && segments[1] == "d" {
        if url.path().ends_with("/mobilebasic") {
            return None;
        }
        let doc_id = segments[2];
        let mut rewritten = url.clone();
        rewritten.set_path(&format!("/document/d/{doc_id}/mobilebasic"));
        rewritten.set_query(None);
        rewritten.set_fragment(None);
        return Some(rewritten);
    }
    if segments.len() >= 3 && segments[0] == "spreadsheets" && segments[1] == "d" {
        if url.path().ends_with("/htmlview") {
            return None;
        }
        let doc_id = segments[2];
        let mut rewritten = url.clone();
        rewritten.set_path(&format!("/spreadsheets/d/{doc_id}/htmlview"));
        rewritten.set_query(None);
        rewritten.set_fragment(None);
        return Some(rewritten);
    }
    None
}

/// Two-label public suffixes common enough to special-case without pulling
/// in a full public-suffix-list dependency; anything else falls back to
/// "last label is the suffix".
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "gov.uk", "ac.uk", "co.jp", "co.nz", "co.in", "co.za", "com.au", "com.br",
    "com.mx", "com.cn",
];

/// Splits a lowercased host into `(subdomain, registrable_domain, suffix)`.
fn split_host(host: &str) -> (String, String, String) {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 1 {
        return (String::new(), host.to_string(), String::new());
    }

    let last_two = labels[labels.len().saturating_sub(2)..].join(".");
    let suffix_len = if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        2
    } else {
        1
    };

    if labels.len() <= suffix_len {
        return (String::new(), host.to_string(), String::new());
    }

    let suffix = labels[labels.len() - suffix_len..].join(".");
    let domain_label_idx = labels.len() - suffix_len - 1;
    let domain = format!("{}.{}", labels[domain_label_idx], suffix);
    let subdomain = labels[..domain_label_idx].join(".");
    (subdomain, domain, suffix)
}

/// Derived facts about a canonicalized URL, keyed for cache/dedup use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct URLInfo {
    pub url: String,
    /// Registrable domain, e.g. `example.com`.
    pub website: String,
    /// Full host including subdomain, e.g. `www.example.com`.
    pub full_domain: String,
    pub subdomain: String,
    pub path: String,
    /// Public suffix, e.g. `com` or `co.uk`.
    pub domain_type: String,
    pub unique_page_name: String,
    pub extension: Option<String>,
    pub path_segments: Vec<String>,
}

impl URLInfo {
    /// Canonicalizes `raw_url` and derives every field in one pass.
    /// Never panics on malformed input; returns `InvalidUrl` instead.
    pub fn from_url(raw_url: &str) -> CorvusResult<Self> {
        let cleaned = clean_url(raw_url)?;
        let parsed = Url::parse(&cleaned)
            .map_err(|e| CorvusError::invalid_url(format!("unparsable after cleaning: {e}")))?;

        let host = parsed.host_str().unwrap_or_default();
        let (subdomain, website, domain_type) = split_host(host);
        let full_domain = if subdomain.is_empty() {
            website.clone()
        } else {
            format!("{subdomain}.{website}")
        };

        let path = construct_path(&parsed);
        let unique_page_name = sanitize_page_name(&format!("{full_domain}{path}"));

        let extension = std::path::Path::new(parsed.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_string());

        let path_segments = path
            .split('/')
            .filter(|seg| !seg.trim().is_empty() && !seg.contains('?'))
            .map(|s| s.to_string())
            .collect();

        Ok(URLInfo {
            url: cleaned,
            website,
            full_domain,
            subdomain,
            path,
            domain_type,
            unique_page_name,
            extension,
            path_segments,
        })
    }
}

fn sanitize_page_name(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// `https://` prefix added if missing, fragment stripped, empty-valued
/// query params dropped, bare `/` path emptied.
fn clean_url(raw_url: &str) -> CorvusResult<String> {
    let with_scheme = if Url::parse(raw_url).is_err() && !raw_url.contains("://") {
        format!("https://{raw_url}")
    } else {
        raw_url.to_string()
    };

    let mut parsed = Url::parse(&with_scheme)
        .map_err(|e| CorvusError::invalid_url(format!("cannot parse url: {e}")))?;
    parsed.set_fragment(None);

    let kept_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let qs = serde_urlencoded_pairs(&kept_pairs);
        parsed.set_query(Some(&qs));
    }

    let path = parsed.path().to_string();
    if path == "/" {
        parsed.set_path("");
    }

    Ok(parsed.to_string())
}

fn serde_urlencoded_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencode(k), urlencode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencode(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

fn construct_path(parsed: &Url) -> String {
    let mut path = parsed.path().to_string();
    if path == "/" {
        path.clear();
    } else if path.ends_with('/') {
        path = path.trim_end_matches('/').to_string();
    }

    let kept_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !kept_pairs.is_empty() {
        path.push('?');
        path.push_str(&serde_urlencoded_pairs(&kept_pairs));
    }
    path
}

/// Best-effort registrable-domain extraction for arbitrary (not
/// necessarily canonicalized) URLs, used by the domain filter and logging.
pub fn extract_domain(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            let (subdomain, website, _) = split_host(host);
            if subdomain.is_empty() {
                website
            } else {
                format!("{subdomain}.{website}")
            }
        }
        Err(_) => url.to_string(),
    }
}

static HOSTNAME_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([a-zA-Z0-9]([a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z]{2,}").unwrap()
});

/// Validates a URL is safe and routable to fetch, correcting a missing
/// scheme and applying any registered site rewrite. Rejects loopback,
/// private, reserved, link-local, multicast, and internal-network-suffix
/// hosts. Never panics; always returns a typed error on rejection.
pub fn validate_and_correct(raw_url: &str) -> CorvusResult<String> {
    let trimmed = raw_url.trim();
    if trimmed.is_empty() {
        return Err(CorvusError::invalid_url("URL cannot be empty"));
    }

    let mut candidate = trimmed.to_string();
    if !candidate.starts_with("http://") && !candidate.starts_with("https://") {
        if HOSTNAME_LIKE.is_match(&candidate) || candidate.starts_with("www.") {
            candidate = format!("https://{candidate}");
        }
    }

    let parsed = Url::parse(&candidate)
        .map_err(|_| CorvusError::invalid_url("URL scheme is missing and cannot be inferred"))?;

    if parsed.scheme().is_empty() {
        return Err(CorvusError::invalid_url(
            "URL scheme is missing and cannot be inferred",
        ));
    }
    let host = parsed
        .host_str()
        .ok_or_else(|| CorvusError::invalid_url("URL domain is missing"))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CorvusError::invalid_url(format!(
            "URL scheme must be http or https, got: {}",
            parsed.scheme()
        )));
    }

    let hostname = host.to_lowercase();
    if hostname == "localhost" || hostname.starts_with("127.") {
        return Err(CorvusError::invalid_url(format!(
            "URL points to localhost: {candidate}"
        )));
    }
    if hostname.ends_with(".local")
        || hostname.ends_with(".internal")
        || hostname.ends_with(".intranet")
        || hostname.ends_with(".corp")
    {
        return Err(CorvusError::invalid_url(format!(
            "URL points to internal network: {candidate}"
        )));
    }
    if hostname == "::1" || hostname == "[::1]" {
        return Err(CorvusError::invalid_url(format!(
            "URL points to localhost IPv6: {candidate}"
        )));
    }

    let ip_candidate = hostname
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(&hostname);
    if let Ok(ip) = ip_candidate.parse::<IpAddr>() {
        let blocked = match ip {
            IpAddr::V4(v4) => {
                v4.is_private()
                    || v4.is_loopback()
                    || v4.is_link_local()
                    || v4.is_multicast()
                    || v4.is_broadcast()
                    || v4.is_documentation()
            }
            IpAddr::V6(v6) => v6.is_loopback() || v6.is_multicast() || v6.is_unspecified(),
        };
        if blocked {
            return Err(CorvusError::invalid_url(format!(
                "URL points to private/reserved IP address: {candidate}"
            )));
        }
    }

    let netloc_lower = parsed.host_str().unwrap_or_default().to_lowercase();
    for (site, rewrite) in SITE_REWRITES {
        if *site == netloc_lower {
            if let Some(rewritten) = rewrite(&parsed) {
                return Ok(rewritten.to_string());
            }
        }
    }

    Ok(candidate)
}

/// Joins `path` onto `base_url`, handling absolute URLs, protocol-relative
/// URLs, `data:`/other-scheme URIs, and malformed triple-slash paths the
/// way the source's `join_url` does.
pub fn join_url(base_url: Option<&str>, path: Option<&str>) -> Option<String> {
    let base_url = base_url?;
    let path = match path {
        Some(p) => p,
        None => return Some(base_url.to_string()),
    };
    let path = path.trim();
    if path.is_empty() {
        return Some(base_url.to_string());
    }

    if path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("ftp://")
        || path.starts_with("file://")
        || path.starts_with("data:")
    {
        return Some(path.to_string());
    }

    static SCHEME_LIKE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());
    if SCHEME_LIKE.is_match(path) {
        return Some(path.to_string());
    }

    if path.starts_with("//") && !path.starts_with("///") {
        let base = Url::parse(base_url).ok()?;
        return Some(format!("{}:{}", base.scheme(), path));
    }

    let mut path = path.to_string();
    if path.starts_with("///") {
        path = format!("/{}", path.trim_start_matches('/'));
    }

    if base_url.ends_with("//") && !path.starts_with('/') {
        return Some(format!("{base_url}{path}"));
    }

    let base = Url::parse(base_url).ok()?;
    base.join(&path).ok().map(|u| u.to_string())
}

/// `(is_data_url, is_base64)`.
pub fn is_data_url(url: Option<&str>) -> (bool, bool) {
    match url {
        Some(u) => {
            let lower = u.trim().to_lowercase();
            if !lower.starts_with("data:") {
                (false, false)
            } else {
                (true, lower.contains(";base64,"))
            }
        }
        None => (false, false),
    }
}

/// Finds the best-matching pattern for `path` among `patterns`. Exact
/// matches (ignoring a single trailing slash) win outright; otherwise each
/// `*`-segment contributes specificity 1 and each literal segment
/// contributes 10; the catch-all `/*` scores 1; highest specificity wins,
/// ties broken by first occurrence in `patterns`.
pub fn match_path<'a>(path: &str, patterns: &[&'a str]) -> Option<&'a str> {
    let normalized_path = if path != "/" && path.ends_with('/') {
        path.trim_end_matches('/')
    } else {
        path
    };

    for pattern in patterns {
        let normalized_pattern = if *pattern != "/" && pattern.ends_with('/') {
            pattern.trim_end_matches('/')
        } else {
            pattern
        };
        if normalized_path == normalized_pattern || path == *pattern {
            return Some(pattern);
        }
    }

    let mut matches: Vec<(&str, i32)> = Vec::new();
    let path_parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();

    for pattern in patterns {
        if pattern.contains('*') {
            let pattern_parts: Vec<&str> = pattern.split('/').filter(|p| !p.is_empty()).collect();
            let non_wildcard = pattern_parts.iter().filter(|p| **p != "*").count();
            if non_wildcard > path_parts.len() {
                continue;
            }

            let mut is_match = true;
            let mut specificity = 0i32;
            let mut pattern_idx = 0usize;

            for path_part in &path_parts {
                if pattern_idx >= pattern_parts.len() {
                    if !pattern_parts.contains(&"*") {
                        is_match = false;
                    }
                    break;
                }
                let pattern_part = pattern_parts[pattern_idx];
                if pattern_part == "*" {
                    specificity += 1;
                } else if pattern_part != *path_part {
                    is_match = false;
                    break;
                } else {
                    specificity += 10;
                }
                pattern_idx += 1;
            }

            while is_match && pattern_idx < pattern_parts.len() {
                if pattern_parts[pattern_idx] != "*" {
                    is_match = false;
                    break;
                }
                pattern_idx += 1;
            }

            if is_match {
                matches.push((pattern, specificity));
            }
        } else if *pattern == "/*" && !patterns.is_empty() {
            matches.push((pattern, 1));
        }
    }

    if !matches.is_empty() {
        matches.sort_by(|a, b| b.1.cmp(&a.1));
        return Some(matches[0].0);
    }

    if path == "/" && patterns.contains(&"/") {
        return Some("/");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_bare_host() {
        let info = URLInfo::from_url("example.com/page/").unwrap();
        assert_eq!(info.url, "https://example.com/page");
        assert_eq!(info.website, "example.com");
        assert_eq!(info.path, "/page");
    }

    #[test]
    fn strips_fragment_and_empty_query_values() {
        let info = URLInfo::from_url("https://example.com/a?b=1&c=#frag").unwrap();
        assert!(!info.url.contains('#'));
        assert!(info.url.contains("b=1"));
        assert!(!info.url.contains("c="));
    }

    #[test]
    fn unique_page_name_is_alphanumeric_and_underscore() {
        let info = URLInfo::from_url("https://www.example.com/a/b?q=1").unwrap();
        assert!(
            info.unique_page_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        );
    }

    #[test]
    fn rejects_loopback() {
        assert!(validate_and_correct("http://127.0.0.1/admin").is_err());
        assert!(validate_and_correct("http://localhost/admin").is_err());
    }

    #[test]
    fn rejects_internal_suffix() {
        assert!(validate_and_correct("http://service.internal/x").is_err());
        assert!(validate_and_correct("http://box.corp/x").is_err());
    }

    #[test]
    fn rejects_private_ip() {
        assert!(validate_and_correct("http://10.0.0.5/").is_err());
        assert!(validate_and_correct("http://192.168.1.1/").is_err());
    }

    #[test]
    fn infers_https_for_bare_domain() {
        let corrected = validate_and_correct("example.com/page").unwrap();
        assert!(corrected.starts_with("https://"));
    }

    #[test]
    fn match_path_exact_beats_glob() {
        let patterns = ["/a/*/c", "/a/b/c", "/*"];
        assert_eq!(match_path("/a/b/c", &patterns), Some("/a/b/c"));
    }

    #[test]
    fn match_path_specificity_orders_globs() {
        let patterns = ["/a/*/c", "/a/*/*", "/*"];
        assert_eq!(match_path("/a/b/c", &patterns), Some("/a/*/c"));
    }

    #[test]
    fn match_path_no_match_returns_none() {
        let patterns = ["/x/*", "/y/z"];
        assert_eq!(match_path("/a/b", &patterns), None);
    }

    #[test]
    fn join_url_handles_absolute_and_relative() {
        assert_eq!(
            join_url(Some("https://example.com/a/"), Some("b")).unwrap(),
            "https://example.com/a/b"
        );
        assert_eq!(
            join_url(Some("https://example.com"), Some("https://other.com/x")).unwrap(),
            "https://other.com/x"
        );
        assert_eq!(
            join_url(Some("https://example.com"), Some("//cdn.example.com/x")).unwrap(),
            "https://cdn.example.com/x"
        );
    }

    #[test]
    fn is_data_url_detects_base64() {
        assert_eq!(
            is_data_url(Some("data:image/png;base64,abcd")),
            (true, true)
        );
        assert_eq!(is_data_url(Some("https://example.com")), (false, false));
    }

    #[test]
    fn google_docs_rewrite_applies() {
        let corrected =
            validate_and_correct("https://docs.google.com/document/d/abc123/edit").unwrap();
        assert!(corrected.ends_with("/mobilebasic"));
    }
}
