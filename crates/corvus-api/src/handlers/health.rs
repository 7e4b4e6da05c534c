//! `GET /api/v1/health` — grounded on `riptide-api::handlers::health`'s
//! role (a cheap liveness probe that also reports database reachability)
//! but trimmed to the single `{status, db}` shape spec.md §6 names.

use axum::extract::State;
use axum::Json;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = match &state.db_pool {
        None => "disconnected",
        Some(pool) => match sqlx::query("SELECT 1").execute(pool).await {
            Ok(_) => "connected",
            Err(_) => "error",
        },
    };

    let status = if db == "error" { "degraded" } else { "ok" };

    Json(HealthResponse { status, db })
}
