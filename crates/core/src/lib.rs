pub mod cache;
pub mod catalog;
pub mod config;
pub mod download;
pub mod metrics;
pub mod progress;
pub mod testing;

pub use cache::{
    CacheError, CacheService, CacheStore, CachedSeries, RebuildOutcome, RebuildStats,
    SearchResults, SeriesMap, Snapshot,
};
pub use catalog::{
    CatalogError, CatalogSource, Category, Episode, EpisodeBody, SeriesInfo, SeriesSummary,
    XtreamClient,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use download::{DownloadError, DownloadJob, DownloadOrchestrator, DownloadRequest};
pub use progress::{
    AttachError, JobId, JobInfo, JobKind, JobState, ProgressEvent, ProgressHub, ProgressSender,
    ProgressStatus, Received,
};
