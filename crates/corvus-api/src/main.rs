//! Binary entry point: loads `Settings`, wires up the fetcher/cache/
//! domain-filter/search/PDF collaborators, builds the `Orchestrator`, and
//! serves the route table. Startup sequencing follows
//! `riptide-api::main`'s shape (tracing first, then config, then the
//! collaborators, then the router) but without the teacher's telemetry/
//! metrics/session layers, which sit outside this crate's scope.

use std::sync::Arc;

use corvus_browser::BrowserPool;
use corvus_cache::PageCache;
use corvus_config::{DomainConfigStore, Settings};
use corvus_core::{Orchestrator, PdfExtractor};
use corvus_fetch::Fetcher;
use corvus_search::BraveSearchClient;
use corvus_utils::DomainFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        persistent_cache = settings.persistent_cache_enabled(),
        max_scrape_concurrency = settings.max_scrape_concurrency,
        max_research_concurrency = settings.max_research_concurrency,
        "corvus-api starting"
    );

    let domain_filter = Arc::new(
        DomainFilter::load(
            &corvus_utils::domain_filter::AdblockConfigLoader::with_temp_dir(),
            &["easylist", "fanboy"],
        )
        .await,
    );

    let mut fetcher = Fetcher::new(
        settings.datacenter_proxies.clone(),
        settings.residential_proxies.clone(),
    );
    if settings.playwright_pool_size > 0 {
        match BrowserPool::start(settings.playwright_pool_size).await {
            Ok(pool) => fetcher = fetcher.with_browser_pool(Arc::new(pool)),
            Err(e) => tracing::warn!(error = %e, "browser pool failed to start, browser-fallback fetches will fail"),
        }
    }

    let db_pool = match &settings.database_url {
        Some(url) => match sqlx::PgPool::connect(url).await {
            Ok(pool) => Some(pool),
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to database, continuing without persistent cache/config");
                None
            }
        },
        None => None,
    };

    let cache = Arc::new(match &db_pool {
        Some(pool) => PageCache::with_postgres(
            settings.page_cache_max_size,
            settings.page_cache_ttl_seconds,
            pool.clone(),
        ),
        None => PageCache::memory_only(settings.page_cache_max_size, settings.page_cache_ttl_seconds),
    });

    let domain_config = match &db_pool {
        Some(pool) => match DomainConfigStore::start(pool.clone()).await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::warn!(error = %e, "failed to start domain config store, continuing without domain enforcement");
                None
            }
        },
        None => None,
    };

    let search_client = if settings.brave_api_key.is_some() {
        Some(Arc::new(BraveSearchClient::new(
            settings.brave_api_key.clone(),
            settings.brave_api_key_ai.clone(),
        )))
    } else {
        None
    };

    let pdf_extractor = match PdfExtractor::new() {
        Ok(extractor) => Some(Arc::new(extractor)),
        Err(e) => {
            tracing::warn!(error = %e, "pdfium failed to initialize, pdf pages will return no extractable text");
            None
        }
    };

    let mut orchestrator = Orchestrator::new(
        Arc::new(fetcher),
        cache,
        domain_filter,
        settings.max_scrape_concurrency,
        settings.max_research_concurrency,
    );
    if let Some(store) = domain_config.clone() {
        orchestrator = orchestrator.with_domain_config(store);
    }
    if let Some(client) = search_client.clone() {
        orchestrator = orchestrator.with_search_client(client);
    }
    if let Some(extractor) = pdf_extractor {
        orchestrator = orchestrator.with_pdf_extractor(extractor);
    }
    if let Some(pool) = db_pool.clone() {
        orchestrator = orchestrator.with_failure_log(pool);
    }

    let state = corvus_api::AppState {
        orchestrator: Arc::new(orchestrator),
        api_key: Arc::from(settings.api_key.as_str()),
        db_pool,
        domain_config,
        search_client,
    };

    let app = corvus_api::build_router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind_addr = %bind_addr, "corvus-api listening");
    axum::serve(listener, app).await?;

    Ok(())
}
