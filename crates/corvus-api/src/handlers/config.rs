//! `GET`/`POST /api/v1/config/domains` — the only write surface this crate
//! exposes, backed directly by `DomainConfigStore::all_domains`/
//! `upsert_domain`.

use axum::extract::State;
use axum::Json;

use corvus_types::DomainConfigCreateRequest;

use crate::dto::DomainConfigListResponse;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn list_domains(
    State(state): State<AppState>,
) -> Result<Json<DomainConfigListResponse>, ApiError> {
    let Some(store) = &state.domain_config else {
        return Ok(Json(DomainConfigListResponse { domains: Vec::new() }));
    };
    Ok(Json(DomainConfigListResponse { domains: store.all_domains() }))
}

pub async fn upsert_domain(
    State(state): State<AppState>,
    Json(req): Json<DomainConfigCreateRequest>,
) -> Result<Json<corvus_types::DomainConfig>, ApiError> {
    let Some(store) = &state.domain_config else {
        return Err(ApiError::Internal(
            "domain configuration store not available (no DATABASE_URL configured)".to_string(),
        ));
    };

    if req.url.trim().is_empty() {
        return Err(ApiError::Validation("url must not be empty".to_string()));
    }

    store
        .upsert_domain(&req)
        .await
        .map(Json)
        .map_err(|e| ApiError::Internal(e.to_string()))
}
