//! `POST /api/v1/search` and the two `search-and-scrape` routes. All three
//! go through `BraveSearchClient::multi_search` (one leg per keyword,
//! serialized behind its rate limiter) then
//! `corvus_search::extract_urls_from_search_results` to flatten and dedupe
//! hits, mirroring how `Orchestrator::research` builds its own URL list.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::{Stream, StreamExt};

use corvus_search::{extract_urls_from_search_results, SearchParams};
use corvus_types::ScrapeOptions;

use crate::dto::{
    ScrapeBatchResponse, SearchAndScrapeRequest, SearchRequest, SearchResponse,
};
use crate::errors::ApiError;
use crate::state::AppState;

fn validate_keywords(keywords: &[String]) -> Result<(), ApiError> {
    if keywords.is_empty() || keywords.len() > 10 {
        return Err(ApiError::Validation(
            "keywords must contain between 1 and 10 entries".to_string(),
        ));
    }
    Ok(())
}

pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    validate_keywords(&req.keywords)?;

    let Some(client) = &state.search_client else {
        return Err(ApiError::Internal("search provider not configured".to_string()));
    };

    let mut template = SearchParams::new("")
        .count(req.count.min(20))
        .offset(req.offset)
        .country(req.country.clone());
    template.safe_search = req.safe_search.clone();
    if let Some(freshness) = &req.freshness {
        template = template.freshness(freshness.clone());
    }

    let results = client.multi_search(&req.keywords, &template, 2).await;
    let urls = extract_urls_from_search_results(&results);

    Ok(Json(SearchResponse { total: urls.len(), results: urls }))
}

pub async fn search_and_scrape(
    State(state): State<AppState>,
    Json(req): Json<SearchAndScrapeRequest>,
) -> Result<Json<ScrapeBatchResponse>, ApiError> {
    validate_keywords(&req.keywords)?;

    let Some(client) = state.search_client.clone() else {
        return Err(ApiError::Internal("search provider not configured".to_string()));
    };

    let start = Instant::now();
    let template = SearchParams::new("").count(req.total_results_per_keyword.min(20));
    let search_results = client.multi_search(&req.keywords, &template, 2).await;
    let urls: Vec<String> = extract_urls_from_search_results(&search_results)
        .into_iter()
        .map(|e| e.url)
        .collect();

    let mut options = req.options;
    options.validate();
    let results = state.orchestrator.scrape(&urls, options).await;

    Ok(Json(ScrapeBatchResponse {
        status: "complete",
        execution_time_ms: start.elapsed().as_millis() as u64,
        results,
    }))
}

pub async fn search_and_scrape_stream(
    State(state): State<AppState>,
    Json(req): Json<SearchAndScrapeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_keywords(&req.keywords)?;
    if state.search_client.is_none() {
        return Err(ApiError::Internal("search provider not configured".to_string()));
    }

    let events = sse_events(state, req);
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn sse_events(
    state: AppState,
    req: SearchAndScrapeRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let client = state.search_client.clone().expect("checked by caller");
        let template = SearchParams::new("").count(req.total_results_per_keyword.min(20));
        let search_results = client.multi_search(&req.keywords, &template, 2).await;
        let urls: Vec<String> = extract_urls_from_search_results(&search_results)
            .into_iter()
            .map(|e| e.url)
            .collect();

        yield Ok(Event::default()
            .event("search_done")
            .data(serde_json::json!({ "url_count": urls.len() }).to_string()));

        let mut options: ScrapeOptions = req.options;
        options.validate();
        let results = state.orchestrator.stream_scrape(&urls, options);
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
