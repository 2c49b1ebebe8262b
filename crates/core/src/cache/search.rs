use super::types::{CachedSeries, SearchHit, SearchResults, Snapshot};

/// Case-insensitive substring search over name, actors and plot.
///
/// Results keep snapshot order. An empty query matches nothing.
pub fn search(snapshot: Option<&Snapshot>, query: &str) -> SearchResults {
    let Some(snapshot) = snapshot else {
        return SearchResults::default();
    };

    let mut results = SearchResults {
        results: Vec::new(),
        last_fetch_date: Some(snapshot.last_fetch_date),
    };

    if query.is_empty() {
        return results;
    }

    let needle = query.to_lowercase();
    results.results = snapshot
        .series
        .iter()
        .filter(|(_, series)| matches(series, &needle))
        .map(|(id, series)| SearchHit {
            series_id: id.to_string(),
            series: series.clone(),
        })
        .collect();

    results
}

fn matches(series: &CachedSeries, needle: &str) -> bool {
    series.series_name.to_lowercase().contains(needle)
        || series.actors.join(" ").to_lowercase().contains(needle)
        || series.plot.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SeriesMap;
    use chrono::Utc;

    fn snapshot() -> Snapshot {
        let entries = [
            ("1", "The Long Harbor", vec!["Bob Stone", "Amy Reed"], "Fishermen at sea."),
            ("2", "City Lights", vec!["Carl Nash"], "A detective in a harbor town."),
            ("3", "Orbit", vec![], ""),
        ];
        let series: SeriesMap = entries
            .into_iter()
            .map(|(id, name, actors, plot)| {
                (
                    id.to_string(),
                    CachedSeries {
                        series_name: name.to_string(),
                        category_id: "9".to_string(),
                        actors: actors.into_iter().map(String::from).collect(),
                        plot: plot.to_string(),
                    },
                )
            })
            .collect();

        Snapshot {
            last_fetch_date: Utc::now(),
            categories: vec![],
            series,
        }
    }

    fn ids(results: &SearchResults) -> Vec<&str> {
        results.results.iter().map(|h| h.series_id.as_str()).collect()
    }

    #[test]
    fn test_no_snapshot_is_empty() {
        let results = search(None, "harbor");
        assert!(results.results.is_empty());
        assert!(results.last_fetch_date.is_none());
    }

    #[test]
    fn test_empty_query_is_empty_but_dated() {
        let snap = snapshot();
        let results = search(Some(&snap), "");
        assert!(results.results.is_empty());
        assert_eq!(results.last_fetch_date, Some(snap.last_fetch_date));
    }

    #[test]
    fn test_matches_name_and_plot_in_order() {
        let snap = snapshot();
        assert_eq!(ids(&search(Some(&snap), "harbor")), vec!["1", "2"]);
    }

    #[test]
    fn test_case_insensitive() {
        let snap = snapshot();
        assert_eq!(
            search(Some(&snap), "HARBOR").results,
            search(Some(&snap), "harbor").results
        );
        assert_eq!(ids(&search(Some(&snap), "oRbIt")), vec!["3"]);
    }

    #[test]
    fn test_matches_across_joined_actors() {
        let snap = snapshot();
        assert_eq!(ids(&search(Some(&snap), "stone amy")), vec!["1"]);
        assert_eq!(ids(&search(Some(&snap), "nash")), vec!["2"]);
    }

    #[test]
    fn test_no_match() {
        let snap = snapshot();
        assert!(search(Some(&snap), "zebra").results.is_empty());
    }
}
