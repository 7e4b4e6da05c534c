//! Route table: one line per row of spec.md §6's contract, wrapped in the
//! bearer-auth layer and a trace layer, the same two-layer composition
//! `riptide-api::main`'s router builder uses.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{config, health, research, scrape, search};
use crate::middleware::bearer_auth;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/api/v1/scrape", post(scrape::scrape))
        .route("/api/v1/scrape/stream", post(scrape::scrape_stream))
        .route("/api/v1/search", post(search::search))
        .route("/api/v1/search-and-scrape", post(search::search_and_scrape))
        .route(
            "/api/v1/search-and-scrape/stream",
            post(search::search_and_scrape_stream),
        )
        .route("/api/v1/research", post(research::research))
        .route(
            "/api/v1/config/domains",
            get(config::list_domains).post(config::upsert_domain),
        )
        .layer(from_fn_with_state(state.clone(), bearer_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
