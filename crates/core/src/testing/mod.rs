//! Testing utilities and mock implementations.
//!
//! This module provides a mock catalog source so the cache builder, the
//! download orchestrator and the HTTP API can be tested without a real
//! Xtream panel.
//!
//! # Example
//!
//! ```rust,ignore
//! use reelshelf_core::testing::{fixtures, MockCatalog};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_categories(vec![fixtures::category("1", "Drama")]).await;
//! catalog.set_series_info("s1", fixtures::series_info("Harbor", vec![("1", episodes)])).await;
//!
//! // Use in AppState...
//! ```

mod mock_catalog;

pub use mock_catalog::{MockCatalog, RecordedCatalogCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use crate::catalog::{Category, Episode, SeriesDetails, SeriesInfo, SeriesSummary};

    pub fn category(id: &str, name: &str) -> Category {
        Category {
            category_id: id.to_string(),
            category_name: name.to_string(),
        }
    }

    /// A listed series with the given cast and plot.
    pub fn series_summary(
        id: &str,
        name: &str,
        cast: Option<&str>,
        plot: Option<&str>,
    ) -> SeriesSummary {
        SeriesSummary {
            series_id: id.to_string(),
            name: name.to_string(),
            cast: cast.map(String::from),
            plot: plot.map(String::from),
            ..Default::default()
        }
    }

    pub fn episode(id: &str, title: &str, extension: &str) -> Episode {
        Episode {
            id: id.to_string(),
            episode_num: None,
            title: title.to_string(),
            container_extension: extension.to_string(),
        }
    }

    /// `count` episodes with ids `<prefix>1..` and titles `Episode N`.
    pub fn episodes(prefix: &str, count: usize) -> Vec<Episode> {
        (1..=count)
            .map(|n| Episode {
                id: format!("{}{}", prefix, n),
                episode_num: Some(n.to_string()),
                title: format!("Episode {}", n),
                container_extension: "mp4".to_string(),
            })
            .collect()
    }

    pub fn series_info(name: &str, seasons: Vec<(&str, Vec<Episode>)>) -> SeriesInfo {
        SeriesInfo {
            info: SeriesDetails {
                name: name.to_string(),
                ..Default::default()
            },
            episodes: seasons
                .into_iter()
                .map(|(season, episodes)| (season.to_string(), episodes))
                .collect::<BTreeMap<_, _>>(),
        }
    }
}
