//! `POST /api/v1/research` — streams `Orchestrator::research`'s
//! `ResearchEvent`s as SSE, one `page_result` per completed page followed
//! by a closing `done` that always carries the `ResearchDoneEvent` payload
//! (spec.md §6: "SSE of ResearchPageEvent* + ResearchDoneEvent").

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{Stream, StreamExt};

use corvus_types::ResearchEvent;

use crate::dto::ResearchRequest;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn research(
    State(state): State<AppState>,
    Json(req): Json<ResearchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::Validation("query must not be empty".to_string()));
    }

    let events = sse_events(state, req);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_events(
    state: AppState,
    req: ResearchRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let stream = state.orchestrator.research(
            &req.query,
            &req.country,
            &req.effort,
            req.freshness.as_deref(),
            &req.safe_search,
        );
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            let (name, payload) = match &event {
                ResearchEvent::Page(page) => ("page_result", serde_json::to_value(page)),
                ResearchEvent::Done(done) => ("done", serde_json::to_value(done)),
            };
            let event = match payload {
                Ok(value) => Event::default().event(name).data(value.to_string()),
                Err(_) => Event::default().event(name).data("{}"),
            };
            yield Ok(event);
        }
    }
}
