//! `POST /api/v1/scrape` and `POST /api/v1/scrape/stream` — batch and SSE
//! variants over the same `Orchestrator::scrape`/`stream_scrape` pair.
//! Per spec.md §7, a per-URL failure is data (an error `ScrapeResult`), so
//! this handler only ever returns a non-200 for the request-level
//! failures `ApiError` models (bad auth, bad body).

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{Stream, StreamExt};

use crate::dto::{ScrapeBatchResponse, ScrapeRequest};
use crate::errors::ApiError;
use crate::state::AppState;

fn validate(req: &ScrapeRequest) -> Result<(), ApiError> {
    if req.urls.is_empty() || req.urls.len() > 100 {
        return Err(ApiError::Validation(
            "urls must contain between 1 and 100 entries".to_string(),
        ));
    }
    Ok(())
}

pub async fn scrape(
    State(state): State<AppState>,
    Json(mut req): Json<ScrapeRequest>,
) -> Result<Json<ScrapeBatchResponse>, ApiError> {
    validate(&req)?;
    req.options.validate();

    let start = Instant::now();
    let results = state.orchestrator.scrape(&req.urls, req.options).await;

    Ok(Json(ScrapeBatchResponse {
        status: "complete",
        execution_time_ms: start.elapsed().as_millis() as u64,
        results,
    }))
}

pub async fn scrape_stream(
    State(state): State<AppState>,
    Json(mut req): Json<ScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;
    req.options.validate();

    let events = sse_events(state, req);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_events(
    state: AppState,
    req: ScrapeRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let results = state.orchestrator.stream_scrape(&req.urls, req.options);
        futures::pin_mut!(results);
        while let Some(result) = results.next().await {
            let event = Event::default()
                .event("page_result")
                .json_data(&result)
                .unwrap_or_else(|_| Event::default().event("page_result").data("{}"));
            yield Ok(event);
        }
        yield Ok(Event::default()
            .event("done")
            .data(serde_json::json!({ "status": "complete" }).to_string()));
    }
}
