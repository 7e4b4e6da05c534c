//! Per-call options accepted by `scrape`/`stream_scrape`.

use serde::{Deserialize, Serialize};

use crate::enums::{OutputMode, ProxyType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    pub use_cache: bool,
    pub cache_ttl_days: u16,
    pub proxy_type: ProxyType,
    pub use_impersonation: bool,
    pub use_browser_fallback: bool,
    pub force_browser: bool,
    pub output_mode: OutputMode,

    pub get_text_data: bool,
    pub get_organized_data: bool,
    pub get_structured_data: bool,
    pub get_links: bool,
    pub get_main_image: bool,
    pub get_overview: bool,
    pub get_content_filter_removal_details: bool,

    pub include_highlighting_markers: bool,
    pub include_media: bool,
    pub include_anchors: bool,
    pub anchor_size: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            cache_ttl_days: 30,
            proxy_type: ProxyType::Datacenter,
            use_impersonation: true,
            use_browser_fallback: false,
            force_browser: false,
            output_mode: OutputMode::Rich,

            get_text_data: true,
            get_organized_data: false,
            get_structured_data: false,
            get_links: false,
            get_main_image: true,
            get_overview: false,
            get_content_filter_removal_details: false,

            include_highlighting_markers: true,
            include_media: true,
            include_anchors: true,
            anchor_size: 100,
        }
    }
}

impl ScrapeOptions {
    /// The reduced option set the research pipeline uses: only
    /// `ai_research_content`, no text/links/overview.
    pub fn for_research() -> Self {
        Self {
            output_mode: OutputMode::Research,
            get_text_data: false,
            get_organized_data: false,
            get_structured_data: false,
            get_links: false,
            get_main_image: false,
            get_overview: false,
            get_content_filter_removal_details: false,
            ..Self::default()
        }
    }

    /// Clamp `cache_ttl_days`/`anchor_size` to the ranges the source
    /// enforces via pydantic field constraints (`ge`/`le`).
    pub fn validate(&mut self) {
        self.cache_ttl_days = self.cache_ttl_days.clamp(1, 365);
    }
}
