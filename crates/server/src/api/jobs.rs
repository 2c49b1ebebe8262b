//! Job listing and progress streaming.
//!
//! `GET /jobs/{id}/events` drains the job's progress channel as
//! Server-Sent Events. Each progress event becomes one `data:` frame; an
//! idle channel produces a `: keep-alive` comment; the response ends once
//! the job's sentinel has been read.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{
        sse::{Event, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use tracing::{debug, warn};

use reelshelf_core::{progress::ReceiverLease, AttachError, JobId, JobInfo, Received};

use super::handlers::{api_error, ApiError};
use crate::metrics::{SSE_CONNECTIONS_ACTIVE, SSE_CONNECTIONS_TOTAL, SSE_FRAMES_SENT};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobInfo>,
    pub total: usize,
}

/// GET /api/v1/jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<JobListResponse> {
    let jobs = state.hub().list();
    let total = jobs.len();
    Json(JobListResponse { jobs, total })
}

/// GET /api/v1/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobInfo>, ApiError> {
    state
        .hub()
        .get(&JobId::from(id.as_str()))
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Job not found: {}", id)))
}

/// GET /api/v1/jobs/{id}/events
pub async fn job_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = JobId::from(id.as_str());
    let lease = state.hub().attach(&job_id).map_err(|e| {
        debug!("Rejected progress viewer: {}", e);
        match e {
            AttachError::NotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
            AttachError::AlreadyAttached(_) | AttachError::Drained(_) => {
                api_error(StatusCode::CONFLICT, e.to_string())
            }
        }
    })?;

    debug!("Progress viewer attached to job {}", job_id);
    let session = StreamSession {
        lease,
        keep_alive: state.keep_alive(),
        _connection: ConnectionGuard::open(),
    };

    Ok((
        [(
            HeaderName::from_static("x-accel-buffering"),
            HeaderValue::from_static("no"),
        )],
        Sse::new(event_stream(session)),
    ))
}

// ============================================================================
// Stream plumbing
// ============================================================================

/// Tracks one open SSE connection in the metrics.
struct ConnectionGuard;

impl ConnectionGuard {
    fn open() -> Self {
        SSE_CONNECTIONS_TOTAL.inc();
        SSE_CONNECTIONS_ACTIVE.inc();
        Self
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        SSE_CONNECTIONS_ACTIVE.dec();
    }
}

/// State carried across stream polls. Dropping it (client gone or stream
/// done) hands the receiver back to the hub.
struct StreamSession {
    lease: ReceiverLease,
    keep_alive: Duration,
    _connection: ConnectionGuard,
}

fn event_stream(session: StreamSession) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(session, |mut session| async move {
        loop {
            match session.lease.next_within(session.keep_alive).await {
                Received::Event(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        SSE_FRAMES_SENT.with_label_values(&["data"]).inc();
                        return Some((Ok(Event::default().data(json)), session));
                    }
                    Err(e) => {
                        warn!("Dropping unserializable progress event: {}", e);
                        continue;
                    }
                },
                Received::KeepAlive => {
                    SSE_FRAMES_SENT.with_label_values(&["keep_alive"]).inc();
                    return Some((Ok(Event::default().comment("keep-alive")), session));
                }
                Received::Closed => {
                    debug!("Progress stream finished");
                    return None;
                }
            }
        }
    })
}
