//! Full cache rebuild from the remote catalog.

use std::time::Instant;

use tracing::{debug, info, warn};

use super::store::CacheStore;
use super::types::{CachedSeries, RebuildOutcome, RebuildStats, Snapshot};
use super::CacheError;
use crate::catalog::{CatalogSource, SeriesSummary};
use crate::metrics;
use crate::progress::{ProgressSender, ProgressStatus};

/// Normalize a listed series into its cached form.
///
/// Returns `None` when the id or the name is missing.
pub fn admit(summary: &SeriesSummary, category_id: &str) -> Option<(String, CachedSeries)> {
    if summary.series_id.is_empty() || summary.name.is_empty() {
        return None;
    }

    let actors = summary
        .cast
        .as_deref()
        .filter(|cast| !cast.is_empty())
        .map(|cast| cast.split(", ").map(str::to_string).collect())
        .unwrap_or_default();

    Some((
        summary.series_id.clone(),
        CachedSeries {
            series_name: summary.name.clone(),
            category_id: category_id.to_string(),
            actors,
            plot: summary.plot.clone().unwrap_or_default(),
        },
    ))
}

/// Rebuild the whole snapshot and save it.
///
/// Progress goes to `progress`; the sentinel is left to the caller.
pub async fn rebuild(
    source: &dyn CatalogSource,
    store: &CacheStore,
    progress: &ProgressSender,
) -> Result<RebuildOutcome, CacheError> {
    let started = Instant::now();
    info!("Starting series cache rebuild");

    let categories = match source.get_series_categories().await {
        Ok(categories) => categories,
        Err(e) => {
            warn!("Failed to fetch categories: {}", e);
            Vec::new()
        }
    };

    if categories.is_empty() {
        warn!("No categories found to cache");
        progress.report(100.0, "No categories found.", ProgressStatus::Error);
        metrics::CACHE_REBUILDS
            .with_label_values(&["no_categories"])
            .inc();
        return Ok(RebuildOutcome::NoCategories);
    }

    let total = categories.len();
    let mut snapshot = Snapshot::new();
    let mut stats = RebuildStats {
        categories_total: total,
        ..Default::default()
    };

    for (i, category) in categories.into_iter().enumerate() {
        let percent = ((i + 1) * 100 / total) as f64;
        progress.report(
            percent,
            format!("Processing category: {}", category.category_name),
            ProgressStatus::InProgress,
        );

        if !category.is_complete() {
            warn!("Skipping category due to missing ID or name: {:?}", category);
            stats.categories_skipped += 1;
            continue;
        }

        debug!(
            "Processing category: {} (ID: {})",
            category.category_name, category.category_id
        );

        let series_list = match source.get_series(&category.category_id).await {
            Ok(list) => list,
            Err(e) => {
                warn!(
                    "Failed to list series for category {} ({}): {}",
                    category.category_name, category.category_id, e
                );
                stats.categories_failed += 1;
                snapshot.categories.push(category);
                continue;
            }
        };

        if series_list.is_empty() {
            debug!("No series found for category: {}", category.category_name);
        }

        for summary in &series_list {
            match admit(summary, &category.category_id) {
                Some((series_id, series)) => {
                    debug!(
                        "Cached series: {} (total: {})",
                        series.series_name,
                        stats.series_cached + 1
                    );
                    snapshot.series.insert(series_id, series);
                    stats.series_cached += 1;
                    metrics::SERIES_CACHED.inc();
                }
                None => {
                    warn!(
                        "Skipping series due to missing ID or name: id={:?}, name={:?}",
                        summary.series_id, summary.name
                    );
                    stats.series_skipped += 1;
                    metrics::SERIES_SKIPPED.inc();
                }
            }
        }

        stats.categories_processed += 1;
        snapshot.categories.push(category);
    }

    if let Err(e) = store.save(&snapshot).await {
        metrics::CACHE_REBUILDS.with_label_values(&["failed"]).inc();
        return Err(e);
    }

    info!(
        "Caching process completed: {} series cached, {} skipped, {} categories failed, {} skipped ({:.1}s)",
        stats.series_cached,
        stats.series_skipped,
        stats.categories_failed,
        stats.categories_skipped,
        started.elapsed().as_secs_f64()
    );
    progress.report(100.0, "Caching process completed.", ProgressStatus::Complete);

    metrics::CACHE_REBUILDS
        .with_label_values(&["completed"])
        .inc();
    metrics::CACHE_REBUILD_DURATION
        .with_label_values(&["completed"])
        .observe(started.elapsed().as_secs_f64());

    Ok(RebuildOutcome::Completed(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, name: &str, cast: Option<&str>, plot: Option<&str>) -> SeriesSummary {
        SeriesSummary {
            series_id: id.to_string(),
            name: name.to_string(),
            cast: cast.map(String::from),
            plot: plot.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_admit_splits_actors() {
        let (id, series) = admit(&summary("s1", "X", Some("Bob, Amy"), Some("p")), "1").unwrap();
        assert_eq!(id, "s1");
        assert_eq!(series.series_name, "X");
        assert_eq!(series.category_id, "1");
        assert_eq!(series.actors, vec!["Bob", "Amy"]);
        assert_eq!(series.plot, "p");
    }

    #[test]
    fn test_admit_defaults_missing_fields() {
        let (_, series) = admit(&summary("s2", "Y", None, None), "4").unwrap();
        assert!(series.actors.is_empty());
        assert_eq!(series.plot, "");
    }

    #[test]
    fn test_admit_rejects_missing_id_or_name() {
        assert!(admit(&summary("", "Y", None, None), "1").is_none());
        assert!(admit(&summary("s3", "", None, None), "1").is_none());
    }

    #[test]
    fn test_admit_single_actor_keeps_inner_commas() {
        let (_, series) = admit(&summary("s4", "Z", Some("Smith,John"), None), "1").unwrap();
        assert_eq!(series.actors, vec!["Smith,John"]);
    }
}
