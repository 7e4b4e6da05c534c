//! Typed errors for the corvus pipeline.
//!
//! Variant set covers the failure kinds named in spec §7 plus the
//! infrastructure failures (config, persistence, serialization) a real
//! deployment hits before a single URL is even fetched.

use thiserror::Error;

use crate::enums::FailureReason;

#[derive(Error, Debug)]
pub enum CorvusError {
    /// A URL failed canonicalization/validation (scheme, host, or reserved-range check).
    #[error("invalid url: {message}")]
    InvalidUrl { message: String },

    /// A categorized fetch failure, carrying the same kind recorded in the failure log.
    #[error("fetch failed ({kind:?}): {message}")]
    FetchFailed {
        kind: FailureReason,
        message: String,
    },

    /// The browser pool could not service a `request_type=browser` fetch.
    #[error("browser pool unavailable: {message}")]
    BrowserUnavailable { message: String },

    /// DOM/document parsing failed outside the fetcher's own classification.
    #[error("parse error: {message}")]
    ParseError { message: String },

    /// Cache tier (memory or persistent) failed to read or write.
    #[error("cache error: {message}")]
    CacheError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Domain-configuration store failed to load or refresh a snapshot.
    #[error("domain config error: {message}")]
    ConfigError { message: String },

    /// Search provider call failed after retries.
    #[error("search error: {message}")]
    SearchError { message: String },

    /// Environment/settings value missing or malformed.
    #[error("settings error: {field}: {message}")]
    SettingsError { field: String, message: String },

    /// Database connection or query error.
    #[error("database error: {message}")]
    DatabaseError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON encode/decode error at a system boundary.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

impl CorvusError {
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            message: message.into(),
        }
    }

    pub fn fetch_failed(kind: FailureReason, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            kind,
            message: message.into(),
        }
    }

    pub fn browser_unavailable(message: impl Into<String>) -> Self {
        Self::BrowserUnavailable {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn cache<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CacheError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn cache_msg(message: impl Into<String>) -> Self {
        Self::CacheError {
            message: message.into(),
            source: None,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn search(message: impl Into<String>) -> Self {
        Self::SearchError {
            message: message.into(),
        }
    }

    pub fn settings(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SettingsError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::DatabaseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Whether the fetcher's retry ladder should attempt a different proxy/transport.
    pub fn is_retryable(&self) -> bool {
        match self {
            CorvusError::FetchFailed { kind, .. } => kind.is_retryable(),
            CorvusError::BrowserUnavailable { .. } => false,
            CorvusError::InvalidUrl { .. } => false,
            CorvusError::ParseError { .. } => false,
            CorvusError::CacheError { .. } => true,
            CorvusError::ConfigError { .. } => true,
            CorvusError::SearchError { .. } => true,
            CorvusError::SettingsError { .. } => false,
            CorvusError::DatabaseError { .. } => true,
            CorvusError::SerializationError { .. } => false,
        }
    }
}

impl From<sqlx::Error> for CorvusError {
    fn from(err: sqlx::Error) -> Self {
        CorvusError::DatabaseError {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for CorvusError {
    fn from(err: serde_json::Error) -> Self {
        CorvusError::SerializationError {
            message: err.to_string(),
        }
    }
}

pub type CorvusResult<T> = Result<T, CorvusError>;
