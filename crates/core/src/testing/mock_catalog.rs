//! Mock catalog source for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{
    CatalogError, CatalogSource, Category, Episode, EpisodeBody, SeriesInfo, SeriesSummary,
};

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogCall {
    GetSeriesCategories,
    GetSeries { category_id: String },
    GetSeriesInfo { series_id: String },
    OpenEpisode { episode_id: String },
}

/// Canned body of an episode file.
#[derive(Debug, Clone)]
struct MockEpisodeBody {
    data: Bytes,
    chunk_size: usize,
    /// Announced `Content-Length`.
    content_length: Option<u64>,
    /// Fail the stream after this many bytes.
    fail_after: Option<usize>,
}

/// Mock implementation of the CatalogSource trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable categories, series listings and series info
/// - Serve episode bodies in chunks, optionally failing mid-stream
/// - Track calls for assertions
/// - Simulate failures per category or for the next call
///
/// # Example
///
/// ```rust,ignore
/// use reelshelf_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.set_categories(vec![fixtures::category("1", "Drama")]).await;
/// catalog
///     .set_series("1", vec![fixtures::series_summary("s1", "Harbor", Some("Bob, Amy"), None)])
///     .await;
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    categories: Arc<RwLock<Vec<Category>>>,
    /// Series listings by category id.
    series: Arc<RwLock<HashMap<String, Vec<SeriesSummary>>>>,
    /// Series info by series id.
    series_info: Arc<RwLock<HashMap<String, SeriesInfo>>>,
    /// Episode bodies by episode id.
    episodes: Arc<RwLock<HashMap<String, MockEpisodeBody>>>,
    /// Categories whose listing fails.
    failing_categories: Arc<RwLock<HashSet<String>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCatalogCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            categories: Arc::new(RwLock::new(Vec::new())),
            series: Arc::new(RwLock::new(HashMap::new())),
            series_info: Arc::new(RwLock::new(HashMap::new())),
            episodes: Arc::new(RwLock::new(HashMap::new())),
            failing_categories: Arc::new(RwLock::new(HashSet::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Metadata Configuration
    // =========================================================================

    pub async fn set_categories(&self, categories: Vec<Category>) {
        *self.categories.write().await = categories;
    }

    /// Set the series listing of a category.
    pub async fn set_series(&self, category_id: &str, series: Vec<SeriesSummary>) {
        self.series
            .write()
            .await
            .insert(category_id.to_string(), series);
    }

    /// Make listing this category fail.
    pub async fn fail_category(&self, category_id: &str) {
        self.failing_categories
            .write()
            .await
            .insert(category_id.to_string());
    }

    pub async fn set_series_info(&self, series_id: &str, info: SeriesInfo) {
        self.series_info
            .write()
            .await
            .insert(series_id.to_string(), info);
    }

    // =========================================================================
    // Episode Configuration
    // =========================================================================

    /// Serve `data` for an episode, in chunks of `chunk_size` bytes.
    pub async fn set_episode_body(&self, episode_id: &str, data: impl Into<Bytes>, chunk_size: usize) {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        self.episodes.write().await.insert(
            episode_id.to_string(),
            MockEpisodeBody {
                data,
                chunk_size: chunk_size.max(1),
                content_length,
                fail_after: None,
            },
        );
    }

    /// Serve an episode whose stream breaks after `fail_after` bytes.
    pub async fn set_failing_episode(
        &self,
        episode_id: &str,
        data: impl Into<Bytes>,
        chunk_size: usize,
        fail_after: usize,
    ) {
        let data = data.into();
        let content_length = Some(data.len() as u64);
        self.episodes.write().await.insert(
            episode_id.to_string(),
            MockEpisodeBody {
                data,
                chunk_size: chunk_size.max(1),
                content_length,
                fail_after: Some(fail_after),
            },
        );
    }

    /// Serve `data` while announcing a `Content-Length` of `content_length`.
    ///
    /// The stream ends cleanly, so a larger announced length models a body
    /// cut short by the server.
    pub async fn set_truncated_episode(
        &self,
        episode_id: &str,
        data: impl Into<Bytes>,
        chunk_size: usize,
        content_length: u64,
    ) {
        self.episodes.write().await.insert(
            episode_id.to_string(),
            MockEpisodeBody {
                data: data.into(),
                chunk_size: chunk_size.max(1),
                content_length: Some(content_length),
                fail_after: None,
            },
        );
    }

    // =========================================================================
    // Failure Simulation & Assertions
    // =========================================================================

    /// Make the next operation fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// All calls made so far.
    pub async fn calls(&self) -> Vec<RecordedCatalogCall> {
        self.calls.read().await.clone()
    }

    /// Number of episode bodies opened.
    pub async fn episodes_opened(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedCatalogCall::OpenEpisode { .. }))
            .count()
    }

    async fn record(&self, call: RecordedCatalogCall) -> Result<(), CatalogError> {
        self.calls.write().await.push(call);
        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn get_series_categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.record(RecordedCatalogCall::GetSeriesCategories)
            .await?;
        Ok(self.categories.read().await.clone())
    }

    async fn get_series(&self, category_id: &str) -> Result<Vec<SeriesSummary>, CatalogError> {
        self.record(RecordedCatalogCall::GetSeries {
            category_id: category_id.to_string(),
        })
        .await?;

        if self.failing_categories.read().await.contains(category_id) {
            return Err(CatalogError::ApiError {
                status: 500,
                message: format!("category {} is broken", category_id),
            });
        }

        Ok(self
            .series
            .read()
            .await
            .get(category_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_series_info(&self, series_id: &str) -> Result<SeriesInfo, CatalogError> {
        self.record(RecordedCatalogCall::GetSeriesInfo {
            series_id: series_id.to_string(),
        })
        .await?;

        self.series_info
            .read()
            .await
            .get(series_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("series {}", series_id)))
    }

    async fn open_episode(&self, episode: &Episode) -> Result<EpisodeBody, CatalogError> {
        self.record(RecordedCatalogCall::OpenEpisode {
            episode_id: episode.id.clone(),
        })
        .await?;

        let body = self
            .episodes
            .read()
            .await
            .get(&episode.id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("episode {}", episode.id)))?;

        let limit = body.fail_after.unwrap_or(body.data.len()).min(body.data.len());
        let mut items: Vec<Result<Bytes, CatalogError>> = Vec::new();
        let mut offset = 0;
        while offset < limit {
            let end = (offset + body.chunk_size).min(limit);
            items.push(Ok(body.data.slice(offset..end)));
            offset = end;
        }
        if body.fail_after.is_some() {
            items.push(Err(CatalogError::Transfer("connection reset by peer".to_string())));
        }

        Ok(EpisodeBody {
            content_length: body.content_length,
            stream: futures::stream::iter(items).boxed(),
        })
    }
}
