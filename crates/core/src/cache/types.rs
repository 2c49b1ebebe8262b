use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Category;

/// A series as kept in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSeries {
    pub series_name: String,
    #[serde(rename = "category_ID")]
    pub category_id: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub plot: String,
}

/// Series keyed by id, iterated in insertion order.
///
/// Re-inserting an existing id replaces the value but keeps its position.
pub type SeriesMap = IndexMap<String, CachedSeries>;

/// Accepts RFC 3339 as well as naive ISO-8601 timestamps (read as UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| D::Error::custom(format!("invalid last_fetch_date '{}': {}", raw, e)))
}

/// The persisted cache document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_fetch_date: DateTime<Utc>,
    /// Categories admitted by the rebuild, in source order.
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub series: SeriesMap,
}

impl Snapshot {
    /// An empty snapshot stamped with the current time.
    pub fn new() -> Self {
        Self {
            last_fetch_date: Utc::now(),
            categories: Vec::new(),
            series: SeriesMap::new(),
        }
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// A search match: the cached series plus its id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub series_id: String,
    #[serde(flatten)]
    pub series: CachedSeries,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
    pub last_fetch_date: Option<DateTime<Utc>>,
}

/// Counters gathered while rebuilding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebuildStats {
    pub categories_total: usize,
    pub categories_processed: usize,
    /// Categories without an id or a name.
    pub categories_skipped: usize,
    /// Categories whose series listing failed.
    pub categories_failed: usize,
    pub series_cached: usize,
    pub series_skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// The catalog returned no categories, nothing was written.
    NoCategories,
    Completed(RebuildStats),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(name: &str) -> CachedSeries {
        CachedSeries {
            series_name: name.to_string(),
            category_id: "1".to_string(),
            actors: vec![],
            plot: String::new(),
        }
    }

    #[test]
    fn test_series_map_keeps_insertion_order() {
        let mut map = SeriesMap::new();
        map.insert("30".to_string(), series("C"));
        map.insert("10".to_string(), series("A"));
        map.insert("20".to_string(), series("B"));

        let ids: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);

        let json = serde_json::to_string(&map).unwrap();
        let back: SeriesMap = serde_json::from_str(&json).unwrap();
        let ids: Vec<&str> = back.keys().map(String::as_str).collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
    }

    #[test]
    fn test_series_map_reinsert_keeps_position() {
        let mut map = SeriesMap::new();
        map.insert("a".to_string(), series("first"));
        map.insert("b".to_string(), series("second"));
        let old = map.insert("a".to_string(), series("replaced"));

        assert_eq!(old.unwrap().series_name, "first");
        assert_eq!(map.len(), 2);
        let names: Vec<&str> = map.values().map(|s| s.series_name.as_str()).collect();
        assert_eq!(names, vec!["replaced", "second"]);
    }

    #[test]
    fn test_cached_series_field_names() {
        let json = serde_json::to_value(series("X")).unwrap();
        assert_eq!(json["category_ID"], "1");
        assert!(json.get("category_id").is_none());
    }

    #[test]
    fn test_snapshot_accepts_naive_timestamp() {
        let raw = r#"{
            "last_fetch_date": "2024-05-01T12:34:56.789012",
            "categories": [],
            "series": {}
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(
            snapshot.last_fetch_date.to_rfc3339(),
            "2024-05-01T12:34:56.789012+00:00"
        );
    }

    #[test]
    fn test_snapshot_rejects_garbage_timestamp() {
        let raw = r#"{"last_fetch_date": "yesterday", "series": {}}"#;
        assert!(serde_json::from_str::<Snapshot>(raw).is_err());
    }

    #[test]
    fn test_search_hit_is_flat() {
        let hit = SearchHit {
            series_id: "7".to_string(),
            series: series("Flat"),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["series_id"], "7");
        assert_eq!(json["series_name"], "Flat");
    }
}
