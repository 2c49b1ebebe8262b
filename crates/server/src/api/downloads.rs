//! Batch download API handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use serde::Serialize;
use tracing::{debug, error};

use reelshelf_core::{DownloadError, DownloadRequest, JobId};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

/// A download request read from a JSON or a url-encoded form body.
#[derive(Debug)]
pub struct DownloadBody(pub DownloadRequest);

impl<S> FromRequest<S> for DownloadBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(request) = Form::<DownloadRequest>::from_request(req, state)
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
            Ok(Self(request))
        } else {
            let Json(request) = Json::<DownloadRequest>::from_request(req, state)
                .await
                .map_err(|e| api_error(e.status(), e.body_text()))?;
            Ok(Self(request))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DownloadStartedResponse {
    pub success: bool,
    pub job_id: JobId,
    pub message: String,
    pub series_name: String,
    pub episode_count: usize,
    pub directory: PathBuf,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/downloads
///
/// Validate the request and start a background download job.
pub async fn start_download(
    State(state): State<Arc<AppState>>,
    DownloadBody(request): DownloadBody,
) -> Result<(StatusCode, Json<DownloadStartedResponse>), ApiError> {
    debug!(
        "Download request - Series ID: {}, Season: {}",
        request.series_id, request.season
    );

    match state.downloads().start(request).await {
        Ok(job) => Ok((
            StatusCode::ACCEPTED,
            Json(DownloadStartedResponse {
                success: true,
                message: format!("Download started for {} episodes", job.episode_count),
                job_id: job.job_id,
                series_name: job.series_name,
                episode_count: job.episode_count,
                directory: job.directory,
            }),
        )),
        Err(e @ DownloadError::InvalidInput(_)) => {
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(DownloadError::Upstream(_)) => Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Could not fetch series information",
        )),
        Err(e @ DownloadError::Io(_)) => {
            error!("Download error: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
