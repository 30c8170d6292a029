use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::config::MAX_DAYS;
use crate::dispatch::render_digest;
use crate::pipeline::{Pipeline, ScanReport};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Cap applied when a query does not pass `limit`
    pub query_cap: usize,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub days: Option<u32>,
    pub limit: Option<usize>,
}

/// Build the Axum router for the liveness probe and interactive queries.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/matches", get(matches_handler))
        .route("/api/matches/digest", get(digest_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run_query(
    state: &AppState,
    query: MatchQuery,
) -> Result<ScanReport, (StatusCode, String)> {
    let days = query.days.unwrap_or_else(|| state.pipeline.default_days());
    if !(1..=MAX_DAYS).contains(&days) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("days must be between 1 and {}", MAX_DAYS),
        ));
    }
    let cap = query.limit.unwrap_or(state.query_cap);
    let today = Utc::now().date_naive();
    Ok(state.pipeline.scan(today, days, Some(cap)).await)
}

/// GET /api/matches?days=3&limit=29
async fn matches_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    run_query(&state, query).await.map(Json)
}

/// GET /api/matches/digest?days=3&limit=29
async fn digest_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    run_query(&state, query)
        .await
        .map(|report| render_digest(&report))
}
