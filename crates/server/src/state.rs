use std::sync::Arc;
use std::time::Duration;

use reelshelf_core::{
    CacheService, CacheStore, CatalogSource, Config, DownloadOrchestrator, ProgressHub,
    SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn CatalogSource>,
    cache: CacheService,
    hub: Arc<ProgressHub>,
    downloads: DownloadOrchestrator,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<dyn CatalogSource>) -> Self {
        let hub = Arc::new(ProgressHub::new(config.progress.job_retention));
        let cache = CacheService::new(CacheStore::new(config.cache.path.clone()));
        let downloads = DownloadOrchestrator::new(
            Arc::clone(&catalog),
            Arc::clone(&hub),
            config.downloads.dir.clone(),
        );

        Self {
            config,
            catalog,
            cache,
            hub,
            downloads,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &Arc<dyn CatalogSource> {
        &self.catalog
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn hub(&self) -> &Arc<ProgressHub> {
        &self.hub
    }

    pub fn downloads(&self) -> &DownloadOrchestrator {
        &self.downloads
    }

    /// Idle time after which a progress stream sends a keep-alive comment.
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.config.progress.keep_alive_secs)
    }
}
