//! The scrape/research orchestrator: ties the fetcher, HTML parser, page
//! cache, and domain-configuration store into `scrape`/`stream_scrape`/
//! `research`, plus the non-HTML content extractors (PDF, image OCR,
//! JSON/XML/plain text) and the failure-log writer those pipelines use.

pub mod content;
pub mod failure_log;
pub mod orchestrator;
pub mod pdf;
pub mod text_extract;

pub use orchestrator::Orchestrator;
pub use pdf::PdfExtractor;
pub use text_extract::{NullTextExtractor, TextExtractor};
