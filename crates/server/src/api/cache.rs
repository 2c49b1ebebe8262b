//! Snapshot cache API handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use reelshelf_core::{cache::SearchHit, CacheError, JobId};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: Option<String>,
    pub results: Vec<SearchHit>,
    pub last_fetch_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct CountsResponse {
    pub counts: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub status: String,
    pub message: String,
    pub job_id: JobId,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/cache/rebuild
///
/// Start a background rebuild. Progress is read from the job's event stream.
pub async fn rebuild(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<RebuildResponse>), ApiError> {
    match state
        .cache()
        .start_rebuild(state.hub(), Arc::clone(state.catalog()))
    {
        Ok(job_id) => {
            info!("Cache rebuild requested, job {}", job_id);
            Ok((
                StatusCode::ACCEPTED,
                Json(RebuildResponse {
                    status: "success".to_string(),
                    message: "Caching process initiated in background.".to_string(),
                    job_id,
                }),
            ))
        }
        Err(CacheError::RebuildInProgress) => Err(api_error(
            StatusCode::CONFLICT,
            CacheError::RebuildInProgress.to_string(),
        )),
        Err(e) => {
            error!("Failed to start cache rebuild: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/v1/cache/search?query=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let query = params.query.unwrap_or_default();
    let found = state.cache().search(&query).await;

    Json(SearchResponse {
        query: (!query.is_empty()).then_some(query),
        results: found.results,
        last_fetch_date: found.last_fetch_date,
    })
}

/// GET /api/v1/cache/counts
pub async fn counts(State(state): State<Arc<AppState>>) -> Json<CountsResponse> {
    Json(CountsResponse {
        counts: state.cache().series_count_by_category().await,
    })
}
