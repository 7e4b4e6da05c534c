//! Shared types for the corvus web scraping and research engine.
//!
//! Everything in this crate is plain data plus the error enum — no I/O, no
//! async. Downstream crates (`corvus-html`, `corvus-fetch`, `corvus-cache`,
//! `corvus-config`, `corvus-core`) build on these shapes so that the wire
//! format, the cache format, and the in-process document model all agree.

pub mod document;
pub mod domain;
pub mod enums;
pub mod errors;
pub mod fetch;
pub mod options;
pub mod results;

pub use document::{ContentNode, ElementMetadata, ListItem, MediaRef, OrganizedData};
pub use domain::{
    BaseConfigRule, DomainConfig, DomainConfigCreateRequest, DomainSettings, PathOverride,
    PathPattern,
};
pub use enums::{
    CmsKind, ConfigType, ContentType, FailureReason, FilterAction, Firewall, MatchType,
    OutputMode, ProxyType, RequestType, Validity, research_effort_cap,
};
pub use errors::{CorvusError, CorvusResult};
pub use fetch::{FailureDetail, FailureLogEntry, FetchResponse};
pub use options::ScrapeOptions;
pub use results::{
    Overview, ParseResult, ResearchDoneEvent, ResearchEvent, ResearchPageEvent, ScrapeResult,
    ScrapeStatus,
};
