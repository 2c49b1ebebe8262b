//! Batch episode downloads.
//!
//! [`DownloadOrchestrator::start`] validates a request synchronously, then
//! hands the transfer to a background job that reports through the
//! progress hub.

mod plan;
mod transfer;

pub use plan::{
    batch_file_names, episode_file_name, parse_episode_number, sanitize_component, season_dir,
    season_episodes, select_episodes,
};
pub use transfer::CHUNK_SIZE;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{deserialize_lenient_string, CatalogError, CatalogSource};
use crate::metrics;
use crate::progress::{JobId, JobKind, ProgressHub};

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Bad series, season or episode range.
    #[error("{0}")]
    InvalidInput(String),

    /// Series information could not be fetched.
    #[error("Could not fetch series information: {0}")]
    Upstream(#[source] CatalogError),

    /// Destination directory could not be created.
    #[error("Failed to prepare download directory: {0}")]
    Io(#[from] std::io::Error),
}

/// A request to download a range of episodes from one season.
///
/// Episode numbers stay raw so that parsing errors surface as input errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub series_id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub season: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub start_episode: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub end_episode: String,
}

/// A scheduled download job.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadJob {
    pub job_id: JobId,
    pub series_name: String,
    pub episode_count: usize,
    pub directory: PathBuf,
}

pub struct DownloadOrchestrator {
    source: Arc<dyn CatalogSource>,
    hub: Arc<ProgressHub>,
    downloads_dir: PathBuf,
}

impl DownloadOrchestrator {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        hub: Arc<ProgressHub>,
        downloads_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            hub,
            downloads_dir: downloads_dir.into(),
        }
    }

    pub fn downloads_dir(&self) -> &std::path::Path {
        &self.downloads_dir
    }

    /// Validate `request` and schedule the transfer.
    ///
    /// Every error is returned before any background work starts.
    pub async fn start(&self, request: DownloadRequest) -> Result<DownloadJob, DownloadError> {
        let series_id = request.series_id.trim();
        if series_id.is_empty() {
            return Err(DownloadError::InvalidInput(
                "series_id is required".to_string(),
            ));
        }

        let start = parse_episode_number(&request.start_episode)?;
        let end = parse_episode_number(&request.end_episode)?;

        let info = self
            .source
            .get_series_info(series_id)
            .await
            .map_err(|e| {
                warn!("Could not fetch series info for ID {}: {}", series_id, e);
                DownloadError::Upstream(e)
            })?;

        let season = request.season.trim();
        let episodes = select_episodes(season_episodes(&info, season)?, start, end)?.to_vec();

        let series_name = if info.info.name.is_empty() {
            format!("Series {}", series_id)
        } else {
            info.info.name.clone()
        };
        let directory = season_dir(&self.downloads_dir, &series_name, season);
        tokio::fs::create_dir_all(&directory).await?;

        let episode_count = episodes.len();
        let description = format!("{} S{} E{}-{}", series_name, season, start, end);
        let source = Arc::clone(&self.source);
        let dir = directory.clone();

        let job_id = self.hub.spawn_job(JobKind::Download, description, move |progress| {
            transfer::run_batch(source, episodes, dir, progress)
        });

        metrics::DOWNLOAD_JOBS_STARTED.inc();
        info!(
            "Download job {} scheduled: {} episodes of {} into {}",
            job_id,
            episode_count,
            series_name,
            directory.display()
        );

        Ok(DownloadJob {
            job_id,
            series_name,
            episode_count,
            directory,
        })
    }
}
