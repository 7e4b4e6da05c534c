//! Bearer-token auth gate. Grounded on
//! `riptide-api::middleware::auth::auth_middleware`'s shape (a public-path
//! allowlist plus an `Authorization: Bearer` check run via `axum::middleware::from_fn_with_state`)
//! but narrowed to the single scheme spec.md §6 names — no `X-API-Key`
//! fallback, no configurable disable switch; this system always requires
//! the configured key.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::AppState;

const PUBLIC_PATHS: &[&str] = &["/api/v1/health"];

pub async fn bearer_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let path = request.uri().path();
    if PUBLIC_PATHS.contains(&path) {
        return Ok(next.run(request).await);
    }

    let provided = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == state.api_key.as_ref() => Ok(next.run(request).await),
        _ => {
            warn!(path = %path, "rejected request with missing or invalid bearer token");
            Err(ApiError::Unauthorized.into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use corvus_core::Orchestrator;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            orchestrator: Arc::new(Orchestrator::new(
                Arc::new(corvus_fetch::Fetcher::new(vec![], vec![])),
                Arc::new(corvus_cache::PageCache::memory_only(10, 60)),
                Arc::new(corvus_utils::DomainFilter::empty()),
                5,
                2,
            )),
            api_key: Arc::from("secret"),
            db_pool: None,
            domain_config: None,
            search_client: None,
        }
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/api/v1/health", get(|| async { "ok" }))
            .route("/api/v1/scrape", get(|| async { "ok" }))
            .layer(from_fn_with_state(state.clone(), bearer_auth))
            .with_state(state)
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app(test_state())
            .oneshot(HttpRequest::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_key_is_rejected() {
        let response = app(test_state())
            .oneshot(HttpRequest::get("/api/v1/scrape").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_key_is_accepted() {
        let response = app(test_state())
            .oneshot(
                HttpRequest::get("/api/v1/scrape")
                    .header("Authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
