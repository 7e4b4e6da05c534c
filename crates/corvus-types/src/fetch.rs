//! The fetcher's output shape and the append-only failure-log row it feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::enums::{CmsKind, ContentType, FailureReason, Firewall, ProxyType, RequestType};

/// One `{kind: message}` entry in [`FetchResponse::failed_reasons`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureDetail {
    pub kind: FailureReason,
    pub message: String,
}

/// The result of a single fetch attempt, success or failure.
///
/// Invariant: if `content_type` is binary (`pdf`/`image`), `content_bytes`
/// is populated and `content` may be empty; otherwise `content` carries the
/// decoded text body. `failed` is true iff `failed_reasons` is non-empty or
/// `status_code >= 400`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub request_url: String,
    pub response_url: String,
    pub request_type: RequestType,
    pub content_type: ContentType,
    pub extension: Option<String>,
    #[serde(default)]
    pub other_extensions: Vec<String>,
    pub raw_content_type_header: Option<String>,
    pub status_code: u16,
    #[serde(default)]
    pub response_headers: HashMap<String, String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_bytes: Option<Vec<u8>>,
    pub title: Option<String>,
    pub proxy_used: Option<String>,
    pub failed: bool,
    pub failed_primary_reason: Option<FailureReason>,
    #[serde(default)]
    pub failed_reasons: Vec<FailureDetail>,
    pub published_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub cms_primary: Option<CmsKind>,
    #[serde(default)]
    pub cms_other: Vec<String>,
    pub firewall: Firewall,
}

impl FetchResponse {
    /// Appends a failure reason and keeps `failed`/`failed_primary_reason`
    /// consistent. Reasons are recorded in the order they're detected, so
    /// the first call here wins the primary slot.
    pub fn add_failure(&mut self, kind: FailureReason, message: impl Into<String>) {
        self.failed_reasons.push(FailureDetail {
            kind,
            message: message.into(),
        });
        self.failed = true;
        if self.failed_primary_reason.is_none() {
            self.failed_primary_reason = Some(kind);
        }
    }

    /// Recomputes `failed` from `failed_reasons` and `status_code`, per the
    /// invariant `failed <=> failed_reasons != [] OR status_code >= 400`.
    pub fn recompute_failed(&mut self) {
        self.failed = !self.failed_reasons.is_empty() || self.status_code >= 400;
        if self.failed_primary_reason.is_none() {
            self.failed_primary_reason = self.failed_reasons.first().map(|d| d.kind);
        }
    }
}

/// An append-only row describing one failed fetch/scrape attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureLogEntry {
    pub target_url: String,
    pub domain_name: String,
    pub failure_reason: FailureReason,
    pub failure_category: String,
    pub status_code: Option<u16>,
    pub error_log: Option<String>,
    pub proxy_used: Option<String>,
    pub proxy_type: Option<ProxyType>,
    pub attempt_count: u32,
    pub created_at: DateTime<Utc>,
}

impl FailureLogEntry {
    pub fn new(
        target_url: impl Into<String>,
        domain_name: impl Into<String>,
        failure_reason: FailureReason,
        attempt_count: u32,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            domain_name: domain_name.into(),
            failure_category: failure_reason.category().to_string(),
            failure_reason,
            status_code: None,
            error_log: None,
            proxy_used: None,
            proxy_type: None,
            attempt_count,
            created_at: Utc::now(),
        }
    }
}
