//! One-off local scrape runner. Grounded on the *existence* of
//! `riptide-cli` as the teacher's thin top-level binary — not on its
//! feature set, which drives a remote API server over HTTP. This CLI has
//! no server to talk to: it builds the same `Orchestrator` the API binary
//! builds and calls `scrape`/`stream_scrape` in-process, for local
//! debugging and one-shot extraction without standing up `corvus-api`.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use corvus_cache::PageCache;
use corvus_config::Settings;
use corvus_core::Orchestrator;
use corvus_fetch::Fetcher;
use corvus_types::{ScrapeOptions, ScrapeStatus};
use corvus_utils::domain_filter::AdblockConfigLoader;
use corvus_utils::DomainFilter;

#[derive(Parser)]
#[command(name = "corvus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scrape one or more URLs using the corvus extraction pipeline")]
struct Cli {
    /// URLs to scrape
    #[arg(required = true)]
    urls: Vec<String>,

    /// Force browser-rendered fetches instead of the plain HTTP path
    #[arg(long)]
    force_browser: bool,

    /// Bypass the page cache for this run
    #[arg(long)]
    no_cache: bool,

    /// Pretty-print the JSON results (default is compact, one line per result)
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    // A local one-off run has no server to authenticate against, so
    // API_KEY (required by `Settings::from_env`) is irrelevant here; build
    // settings directly instead of going through the env loader.
    let settings = Settings::from_env().unwrap_or_else(|_| Settings {
        api_key: String::new(),
        database_url: None,
        datacenter_proxies: Vec::new(),
        residential_proxies: Vec::new(),
        brave_api_key: None,
        brave_api_key_ai: None,
        playwright_pool_size: 0,
        page_cache_ttl_seconds: 1800,
        page_cache_max_size: 1000,
        default_scrape_ttl_days: 30,
        max_scrape_concurrency: 20,
        max_research_concurrency: 5,
    });

    let fetcher = Arc::new(Fetcher::new(
        settings.datacenter_proxies.clone(),
        settings.residential_proxies.clone(),
    ));
    let cache = Arc::new(PageCache::memory_only(
        settings.page_cache_max_size,
        settings.page_cache_ttl_seconds,
    ));
    let domain_filter = Arc::new(DomainFilter::load(&AdblockConfigLoader::with_temp_dir(), &[]).await);

    let orchestrator = Orchestrator::new(
        fetcher,
        cache,
        domain_filter,
        settings.max_scrape_concurrency,
        settings.max_research_concurrency,
    );

    let options = ScrapeOptions {
        use_cache: !cli.no_cache,
        force_browser: cli.force_browser,
        use_browser_fallback: cli.force_browser,
        ..ScrapeOptions::default()
    };

    let results = orchestrator.scrape(&cli.urls, options).await;

    for result in &results {
        let rendered = if cli.pretty {
            serde_json::to_string_pretty(result)?
        } else {
            serde_json::to_string(result)?
        };
        println!("{rendered}");
    }

    let failed = results
        .iter()
        .filter(|r| matches!(r.status, ScrapeStatus::Error))
        .count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
