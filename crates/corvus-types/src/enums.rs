//! Canonical enumerations shared across the scrape pipeline.
//!
//! Variant sets mirror `original_source`'s `app/models/enums.py` and
//! `scraper-service/app/models/enums.py` exactly; string values (used in
//! JSON and in the Postgres columns) are kept identical to the originals
//! so that cached rows written by one version stay readable.

use serde::{Deserialize, Serialize};

/// Classified content type of a fetched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Html,
    #[serde(rename = "md")]
    Markdown,
    Pdf,
    Json,
    Xml,
    #[serde(rename = "txt")]
    PlainText,
    Image,
    Other,
}

impl ContentType {
    /// Content types whose body is read as raw bytes rather than decoded text.
    pub fn is_binary(self) -> bool {
        matches!(self, ContentType::Pdf | ContentType::Image)
    }

    /// Content types the orchestrator knows how to turn into text.
    pub fn is_extractable(self) -> bool {
        matches!(
            self,
            ContentType::Html
                | ContentType::Pdf
                | ContentType::Markdown
                | ContentType::Json
                | ContentType::Xml
                | ContentType::PlainText
                | ContentType::Image
        )
    }

    /// File extension used for cache bookkeeping and `Content-Disposition`-less responses.
    pub fn default_extension(self) -> Option<&'static str> {
        match self {
            ContentType::Html => Some("html"),
            ContentType::Markdown => Some("md"),
            ContentType::Pdf => Some("pdf"),
            ContentType::Json => Some("json"),
            ContentType::Xml => Some("xml"),
            ContentType::PlainText => Some("txt"),
            _ => None,
        }
    }

    /// Reverse lookup from a bare URL extension (lowercased, no dot).
    pub fn from_url_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(ContentType::Pdf),
            "json" => Some(ContentType::Json),
            "xml" => Some(ContentType::Xml),
            "md" => Some(ContentType::Markdown),
            "txt" => Some(ContentType::PlainText),
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp" | "tiff" | "svg" => {
                Some(ContentType::Image)
            }
            _ => None,
        }
    }

    /// Inverse of this type's own wire serialization (`"html"`, `"md"`,
    /// `"pdf"`, ...); used to rehydrate a `content_type` column read back
    /// out of the page cache.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "html" => Some(ContentType::Html),
            "md" => Some(ContentType::Markdown),
            "pdf" => Some(ContentType::Pdf),
            "json" => Some(ContentType::Json),
            "xml" => Some(ContentType::Xml),
            "txt" => Some(ContentType::PlainText),
            "image" => Some(ContentType::Image),
            "other" => Some(ContentType::Other),
            _ => None,
        }
    }

    /// This type's own wire string, e.g. for writing a cache row's
    /// `content_type` column.
    pub fn as_wire(self) -> &'static str {
        match self {
            ContentType::Html => "html",
            ContentType::Markdown => "md",
            ContentType::Pdf => "pdf",
            ContentType::Json => "json",
            ContentType::Xml => "xml",
            ContentType::PlainText => "txt",
            ContentType::Image => "image",
            ContentType::Other => "other",
        }
    }
}

/// Categorized reason a fetch or parse failed. Each variant maps 1:1 to a
/// `failure_category` string used for analytics (see [`FailureReason::category`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    RequestError,
    ProxyError,
    BadStatus,
    CloudflareBlock,
    Blocked,
    NonHtmlContent,
    LowTextContent,
    ParseError,
}

impl FailureReason {
    /// The `failure_category` string recorded in the failure log. Identical
    /// to the variant's own wire name in this system (the original's
    /// `FAILURE_CATEGORY_MAP` is a pure identity map).
    pub fn category(self) -> &'static str {
        match self {
            FailureReason::RequestError => "request_error",
            FailureReason::ProxyError => "proxy_error",
            FailureReason::BadStatus => "bad_status",
            FailureReason::CloudflareBlock => "cloudflare_block",
            FailureReason::Blocked => "blocked",
            FailureReason::NonHtmlContent => "non_html_content",
            FailureReason::LowTextContent => "low_text_content",
            FailureReason::ParseError => "parse_error",
        }
    }

    /// Reasons that the fetcher's retry ladder treats as worth a different
    /// proxy before giving up.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            FailureReason::RequestError | FailureReason::ProxyError | FailureReason::BadStatus
        )
    }
}

/// Content-management-system fingerprint, best-effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmsKind {
    Wordpress,
    Shopify,
    Unknown,
}

/// Known edge-firewall/anti-bot vendor inferred from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Firewall {
    Cloudflare,
    AwsWaf,
    Datadome,
    #[default]
    None,
}

/// Proxy pool a domain should be fetched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Datacenter,
    Residential,
    None,
}

/// How much of the parse result the parser façade should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Rich,
    Research,
}

/// Transport strategy used for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[default]
    Normal,
    Browser,
}

/// Cache-row lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    Active,
    Stale,
    Invalid,
}

/// String-matching mode used by content-filter rules and path overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Partial,
    Regex,
}

/// What a domain path-pattern override applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    ContentFilter,
    MainContent,
}

/// What a matched content-filter/path-override rule does to the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    Add,
    Remove,
    ReplaceAllWith,
}

/// Research effort tier → maximum number of URLs scraped per query.
pub fn research_effort_cap(effort: &str) -> usize {
    match effort {
        "low" => 10,
        "medium" => 25,
        "high" => 50,
        _ => 100, // "extreme" and any unrecognized value fall back to the widest cap
    }
}
