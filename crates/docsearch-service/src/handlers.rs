//! Request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docsearch_index::{execute, select_fields, DocumentSearcher, HitRecord};

use crate::error::AppError;

/// Header carrying the engine duration of a search, in microseconds.
pub const TOOK_HEADER: &str = "x-took";

pub const HELP_TEXT: &str = "\
docsearch

GET|POST /?q=<query>[&limit=<n>]
    Match <query> against the indexed text fields. An optional JSON body
    selects the fields to search and return, e.g. {\"title\": true}.

GET /health
    Service status.
";

pub const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /\n";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<DocumentSearcher>,
    /// Hits returned when the request names no limit
    pub default_limit: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// `X-Took` value: whole microseconds with a `us` suffix.
pub fn format_took(took: Duration) -> String {
    format!("{}us", took.as_micros())
}

/// GET|POST /: field-scoped match search.
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(state.default_limit);
    let searcher = state.searcher.clone();
    let query = params.q;

    let results = tokio::task::spawn_blocking(move || {
        let fields = select_fields(&body)?;
        debug!(query = %query, fields = ?fields, "Searching fields");
        execute(&searcher, &query, fields, limit)
    })
    .await
    .map_err(|e| AppError::internal(format!("search task failed: {}", e)))??;

    info!(
        total = results.total,
        hits = results.hits.len(),
        "Served search request"
    );

    let took = HeaderValue::from_str(&format_took(results.took))
        .map_err(|e| AppError::internal(e.to_string()))?;
    let hits: Vec<HitRecord> = results.hits;
    Ok(([(HeaderName::from_static(TOOK_HEADER), took)], Json(hits)))
}

/// GET /help
pub async fn handle_help() -> &'static str {
    HELP_TEXT
}

/// GET /robots.txt
pub async fn handle_robots() -> &'static str {
    ROBOTS_TXT
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub documents: u64,
}

/// GET /health
pub async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: state.searcher.num_docs(),
    })
}
