pub mod client;
pub mod rate_limit;
pub mod summary;
pub mod types;

pub use client::BraveSearchClient;
pub use rate_limit::RateLimiter;
pub use summary::{extract_urls_from_search_results, generate_search_text_summary, QueryResult};
pub use types::{BraveResult, BraveSearchResponse, ExtractedUrl, ResultsBlock, SearchParams};
