//! URL canonicalization and ad/tracker domain filtering.
//!
//! Pure, synchronous URL functions (no I/O) plus a domain blocklist loader
//! that does do I/O (fetching EasyList-style filter lists) but caches to
//! disk and degrades to "block nothing" if both the network and the local
//! cache are unavailable.

pub mod domain_filter;
pub mod urls;

pub use domain_filter::DomainFilter;
pub use urls::{
    URLInfo, extract_domain, is_data_url, join_url, match_path, validate_and_correct,
};
