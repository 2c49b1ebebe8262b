//! Remote series catalog.
//!
//! The [`CatalogSource`] trait is the seam between the cache builder, the
//! download orchestrator and the remote panel. [`XtreamClient`] talks to a
//! real Xtream player API; tests use `testing::MockCatalog`.

mod types;
mod xtream;

pub use types::*;
pub(crate) use types::deserialize_lenient_string;
pub use xtream::XtreamClient;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

/// Errors that can occur when talking to the remote catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded and retries exhausted.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Panel returned an error status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Episode body stopped before completion.
    #[error("Transfer interrupted: {0}")]
    Transfer(String),
}

/// Streaming body of an episode file.
pub struct EpisodeBody {
    /// Value of the `Content-Length` header, when sent.
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes, CatalogError>>,
}

impl fmt::Debug for EpisodeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpisodeBody")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Source of catalog metadata and episode bytes.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// List series categories in source order.
    async fn get_series_categories(&self) -> Result<Vec<Category>, CatalogError>;

    /// List the series of one category.
    async fn get_series(&self, category_id: &str) -> Result<Vec<SeriesSummary>, CatalogError>;

    /// Fetch details and episodes of one series.
    async fn get_series_info(&self, series_id: &str) -> Result<SeriesInfo, CatalogError>;

    /// Open the byte stream of an episode file.
    async fn open_episode(&self, episode: &Episode) -> Result<EpisodeBody, CatalogError>;
}
