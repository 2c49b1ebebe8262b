//! Local snapshot of catalog metadata.
//!
//! The snapshot is a single JSON file, rebuilt from scratch from the
//! remote catalog and queried for search and per-category counts.

mod builder;
mod search;
mod store;
mod types;

pub use builder::{admit, rebuild};
pub use search::search;
pub use store::CacheStore;
pub use types::*;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::catalog::CatalogSource;
use crate::progress::{JobId, JobKind, ProgressHub, ProgressStatus};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize cache snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid cache path: {0}")]
    InvalidPath(String),

    #[error("A cache rebuild is already running")]
    RebuildInProgress,
}

/// Clears the rebuild flag when dropped.
pub struct RebuildGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RebuildGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Snapshot queries plus serialized rebuilds.
pub struct CacheService {
    store: CacheStore,
    rebuilding: Arc<AtomicBool>,
}

impl CacheService {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            rebuilding: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn is_rebuilding(&self) -> bool {
        self.rebuilding.load(Ordering::Acquire)
    }

    /// Claim the rebuild slot, or fail if a rebuild is running.
    pub fn try_begin_rebuild(&self) -> Result<RebuildGuard, CacheError> {
        self.rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CacheError::RebuildInProgress)?;
        Ok(RebuildGuard {
            flag: Arc::clone(&self.rebuilding),
        })
    }

    /// Start a rebuild job. Rejected while another rebuild runs.
    pub fn start_rebuild(
        &self,
        hub: &Arc<ProgressHub>,
        source: Arc<dyn CatalogSource>,
    ) -> Result<JobId, CacheError> {
        let guard = self.try_begin_rebuild()?;
        let store = self.store.clone();

        let job_id = hub.spawn_job(
            JobKind::CacheRebuild,
            "Rebuild series cache",
            move |progress| async move {
                let _guard = guard;
                match rebuild(source.as_ref(), &store, &progress).await {
                    Ok(RebuildOutcome::Completed(stats)) => {
                        info!(
                            "Cache rebuild {} completed: {} series",
                            progress.job_id(),
                            stats.series_cached
                        );
                    }
                    Ok(RebuildOutcome::NoCategories) => {
                        info!("Cache rebuild {} found no categories", progress.job_id());
                    }
                    Err(e) => {
                        error!("Cache rebuild {} failed: {}", progress.job_id(), e);
                        progress.report(
                            100.0,
                            format!("Caching failed: {}", e),
                            ProgressStatus::Error,
                        );
                    }
                }
            },
        );

        Ok(job_id)
    }

    pub async fn search(&self, query: &str) -> SearchResults {
        if query.is_empty() {
            // Only the date is needed
            return SearchResults {
                results: Vec::new(),
                last_fetch_date: self.store.last_fetch_date().await,
            };
        }
        let snapshot = self.store.load().await;
        search(snapshot.as_ref(), query)
    }

    pub async fn series_count_by_category(&self) -> BTreeMap<String, usize> {
        self.store.series_count_by_category().await
    }

    pub async fn snapshot_summary(&self) -> Option<(chrono::DateTime<chrono::Utc>, usize)> {
        self.store
            .load()
            .await
            .map(|snapshot| (snapshot.last_fetch_date, snapshot.series.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rebuild_guard_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let service = CacheService::new(CacheStore::new(dir.path().join("c.json")));

        let guard = service.try_begin_rebuild().unwrap();
        assert!(service.is_rebuilding());
        assert!(matches!(
            service.try_begin_rebuild(),
            Err(CacheError::RebuildInProgress)
        ));

        drop(guard);
        assert!(!service.is_rebuilding());
        assert!(service.try_begin_rebuild().is_ok());
    }

    #[tokio::test]
    async fn test_search_without_snapshot() {
        let dir = TempDir::new().unwrap();
        let service = CacheService::new(CacheStore::new(dir.path().join("c.json")));

        let results = service.search("anything").await;
        assert!(results.results.is_empty());
        assert!(results.last_fetch_date.is_none());
        assert!(service.series_count_by_category().await.is_empty());
    }
}
