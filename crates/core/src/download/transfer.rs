//! Sequential episode transfer for one download job.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::plan::batch_file_names;
use crate::catalog::{CatalogError, CatalogSource, Episode, EpisodeBody};
use crate::metrics;
use crate::progress::{ProgressEvent, ProgressSender, ProgressStatus};

/// Largest slice written between two progress events.
pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Error)]
enum TransferError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to write episode file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Body ended after {received} of {expected} bytes")]
    Incomplete { expected: u64, received: u64 },
}

/// Download `episodes` one after another into `dir`.
///
/// A failed episode is reported and skipped. The final `complete` event
/// is emitted here; the sentinel is left to the job boundary.
pub async fn run_batch(
    source: Arc<dyn CatalogSource>,
    episodes: Vec<Episode>,
    dir: PathBuf,
    progress: ProgressSender,
) {
    let total = episodes.len();
    let mut succeeded = 0usize;
    let file_names = batch_file_names(&episodes);

    for (i, (episode, file_name)) in episodes.iter().zip(file_names).enumerate() {
        let position = i + 1;
        let path = dir.join(file_name);
        let overall = position as f64 / total as f64 * 100.0;

        match transfer_episode(source.as_ref(), episode, &path, &progress).await {
            Ok(bytes) => {
                debug!(
                    "Downloaded {} ({} bytes) to {}",
                    episode.title,
                    bytes,
                    path.display()
                );
                succeeded += 1;
                metrics::EPISODES_DOWNLOADED
                    .with_label_values(&["success"])
                    .inc();
                progress.episode(&episode.title, overall, ProgressStatus::Success);
            }
            Err(e) => {
                warn!("Error downloading {}: {}", episode.title, e);
                metrics::EPISODES_DOWNLOADED
                    .with_label_values(&["error"])
                    .inc();
                progress.emit(
                    ProgressEvent::new(progress.job_id().clone(), overall, ProgressStatus::Error)
                        .with_episode(episode.title.clone())
                        .with_error(e.to_string()),
                );
            }
        }
    }

    info!(
        "Download job {} finished: {}/{} episodes",
        progress.job_id(),
        succeeded,
        total
    );
    progress.emit(
        ProgressEvent::new(progress.job_id().clone(), 100.0, ProgressStatus::Complete)
            .with_message("All downloads completed"),
    );
}

async fn transfer_episode(
    source: &dyn CatalogSource,
    episode: &Episode,
    path: &Path,
    progress: &ProgressSender,
) -> Result<u64, TransferError> {
    let mut body = source.open_episode(episode).await?;
    let mut file = tokio::fs::File::create(path).await?;

    let result = write_body(&mut body, &mut file, &episode.title, progress).await;
    drop(file);

    if result.is_err() {
        remove_partial(path).await;
    }
    result
}

async fn write_body(
    body: &mut EpisodeBody,
    file: &mut tokio::fs::File,
    title: &str,
    progress: &ProgressSender,
) -> Result<u64, TransferError> {
    let mut downloaded: u64 = 0;

    while let Some(chunk) = body.stream.next().await {
        let chunk = chunk?;
        for piece in chunk.chunks(CHUNK_SIZE) {
            file.write_all(piece).await?;
            downloaded += piece.len() as u64;
            metrics::BYTES_DOWNLOADED.inc_by(piece.len() as u64);
            progress.episode(
                title,
                percent(downloaded, body.content_length),
                ProgressStatus::Downloading,
            );
        }
    }

    file.flush().await?;

    if let Some(expected) = body.content_length {
        if downloaded < expected {
            return Err(TransferError::Incomplete {
                expected,
                received: downloaded,
            });
        }
    }

    Ok(downloaded)
}

fn percent(downloaded: u64, total: Option<u64>) -> f64 {
    match total {
        Some(total) if total > 0 => downloaded as f64 / total as f64 * 100.0,
        _ => 0.0,
    }
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial file {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(50, Some(200)), 25.0);
        assert_eq!(percent(200, Some(200)), 100.0);
        assert_eq!(percent(10, None), 0.0);
        assert_eq!(percent(10, Some(0)), 0.0);
    }
}
