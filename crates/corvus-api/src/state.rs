//! Shared application state handed to every handler via axum's `State`
//! extractor, grounded on `riptide-api::state::AppState`'s role (one
//! cloneable struct wrapping the process's long-lived collaborators) but
//! sized to this crate's much smaller responsibility.

use std::sync::Arc;

use corvus_config::DomainConfigStore;
use corvus_core::Orchestrator;
use corvus_search::BraveSearchClient;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub api_key: Arc<str>,
    pub db_pool: Option<sqlx::PgPool>,
    pub domain_config: Option<Arc<DomainConfigStore>>,
    pub search_client: Option<Arc<BraveSearchClient>>,
}
