//! Types returned by the Xtream player API.
//!
//! Panels are inconsistent about JSON types: ids arrive as strings or
//! numbers, optional text fields arrive as `null`, and an empty episode
//! mapping is sometimes sent as `[]`. Deserialization here absorbs all
//! of that so the rest of the crate sees plain strings.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub(crate) fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(D::Error::custom("Expected string, number, or null")),
    }
}

fn deserialize_optional_lenient_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        // Some panels send lists for cast/genre
        Value::Array(items) => {
            let joined = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(", ");
            Ok(if joined.is_empty() { None } else { Some(joined) })
        }
        _ => Err(D::Error::custom("Expected string, number, array, or null")),
    }
}

fn deserialize_episode_map<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<Episode>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value: Value = Deserialize::deserialize(deserializer)?;

    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(map) => map
            .into_iter()
            .map(|(season, episodes)| {
                serde_json::from_value::<Vec<Episode>>(episodes)
                    .map(|list| (season, list))
                    .map_err(D::Error::custom)
            })
            .collect(),
        // A list of seasons instead of a mapping; seasons are numbered from 1.
        Value::Array(seasons) => seasons
            .into_iter()
            .enumerate()
            .map(|(idx, episodes)| {
                serde_json::from_value::<Vec<Episode>>(episodes)
                    .map(|list| ((idx + 1).to_string(), list))
                    .map_err(D::Error::custom)
            })
            .collect(),
        _ => Err(D::Error::custom("Expected episode mapping, list, or null")),
    }
}

/// A series category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub category_name: String,
}

impl Category {
    /// Both the id and the name are present.
    pub fn is_complete(&self) -> bool {
        !self.category_id.is_empty() && !self.category_name.is_empty()
    }
}

/// A series as listed by `get_series`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub series_id: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cast: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub plot: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<String>,
}

/// Descriptive block of `get_series_info`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesDetails {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cast: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub plot: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub genre: Option<String>,
    #[serde(
        default,
        alias = "releaseDate",
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub release_date: Option<String>,
}

/// Full series record: details plus episodes keyed by season.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesInfo {
    #[serde(default)]
    pub info: SeriesDetails,
    #[serde(default, deserialize_with = "deserialize_episode_map")]
    pub episodes: BTreeMap<String, Vec<Episode>>,
}

impl SeriesInfo {
    /// Episodes of a season, in source order.
    pub fn season(&self, season: &str) -> Option<&[Episode]> {
        self.episodes.get(season).map(Vec::as_slice)
    }
}

/// A downloadable episode file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_num: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_lenient_string")]
    pub container_extension: String,
}
