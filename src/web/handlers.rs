//! HTTP request handlers

use super::state::AppState;
use crate::dispatch::SessionSnapshot;
use crate::error::PipelineError;
use crate::index::SearchResult;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{HealthReport, ScrapeOutcome, ScrapeRequest, SearchQuery};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Body of a scrape request
#[derive(Debug, Deserialize)]
pub struct ScrapeBody {
    pub url: String,
    /// Target index, the configured default when absent
    pub index: Option<String>,
}

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
    pub index: Option<String>,
}

/// Stats response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub version: &'static str,
    pub metrics: MetricsSnapshot,
    pub sessions: Vec<SessionSnapshot>,
}

/// Capture a page and index it
pub async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeBody>, JsonRejection>,
) -> Result<Json<ScrapeOutcome>, PipelineError> {
    let Json(body) = payload.map_err(|e| PipelineError::InvalidRequest(e.body_text()))?;
    let index = body.index.as_deref().unwrap_or(state.default_index());
    let request = ScrapeRequest::new(&body.url, index)?;

    let outcome = state
        .pipeline
        .scrape_and_index(&request)
        .await
        .map_err(|e| {
            error!(url = %request.url(), index = %request.index(), kind = e.kind(), error = %e, "Scrape request failed");
            e
        })?;
    Ok(Json(outcome))
}

/// Free-text search over indexed documents
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResult>, PipelineError> {
    let index = params.index.as_deref().unwrap_or(state.default_index());
    let query = SearchQuery::new(params.query.as_deref().unwrap_or_default(), index)?;

    let result = state.pipeline.search_indexed(&query).await.map_err(|e| {
        error!(query = %query.text(), index = %query.index(), kind = e.kind(), error = %e, "Search request failed");
        e
    })?;
    Ok(Json(result))
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.pipeline.health().await)
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        version: crate::VERSION,
        metrics: state.pipeline.metrics().snapshot(),
        sessions: state.pipeline.sessions(),
    })
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match self {
            PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Indexing(_) | PipelineError::Extraction(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Cleanup(_) | PipelineError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let detail = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
