//! Request validation and destination naming.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::DownloadError;
use crate::catalog::{Episode, SeriesInfo};

/// Path separators and control characters.
static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").unwrap());

/// Make `name` usable as a single path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(name, "_");
    let trimmed = cleaned.trim();
    match trimmed {
        "" | "." | ".." => "untitled".to_string(),
        other => other.to_string(),
    }
}

/// Parse a 1-based episode number from form input.
pub fn parse_episode_number(raw: &str) -> Result<i64, DownloadError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| DownloadError::InvalidInput("Invalid episode numbers".to_string()))
}

/// Episodes `start..=end` (1-based) of a season, clipped to its length.
pub fn select_episodes(episodes: &[Episode], start: i64, end: i64) -> Result<&[Episode], DownloadError> {
    if start < 1 || start > end {
        return Err(DownloadError::InvalidInput(format!(
            "Invalid episode range {}-{}",
            start, end
        )));
    }

    let from = usize::try_from(start - 1).unwrap_or(usize::MAX);
    let to = usize::try_from(end)
        .unwrap_or(usize::MAX)
        .min(episodes.len());

    if from >= to {
        return Err(DownloadError::InvalidInput(
            "No episodes found in selected range".to_string(),
        ));
    }

    Ok(&episodes[from..to])
}

/// Episodes of `season`, or an input error when the season is unknown.
pub fn season_episodes<'a>(info: &'a SeriesInfo, season: &str) -> Result<&'a [Episode], DownloadError> {
    info.season(season).ok_or_else(|| {
        DownloadError::InvalidInput(format!("Invalid season or episode data: season {}", season))
    })
}

/// `<downloads_dir>/<series name> - S<season>`
pub fn season_dir(downloads_dir: &Path, series_name: &str, season: &str) -> PathBuf {
    downloads_dir.join(sanitize_component(&format!(
        "{} - S{}",
        series_name, season
    )))
}

fn file_stem(episode: &Episode) -> &str {
    if episode.title.trim().is_empty() {
        episode.id.as_str()
    } else {
        episode.title.as_str()
    }
}

/// `<title>.<ext>`, falling back to the episode id for untitled episodes.
pub fn episode_file_name(episode: &Episode) -> String {
    sanitize_component(&format!("{}.{}", file_stem(episode), episode.container_extension))
}

/// One file name per episode, unique within the batch.
///
/// A repeated name gets the episode number (or id) appended to its stem,
/// so two same-titled episodes never share a file. Names are compared
/// case-insensitively.
pub fn batch_file_names(episodes: &[Episode]) -> Vec<String> {
    let mut taken = HashSet::new();

    episodes
        .iter()
        .map(|episode| {
            let mut name = episode_file_name(episode);
            if !taken.insert(name.to_lowercase()) {
                let tag = episode
                    .episode_num
                    .as_deref()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or(episode.id.as_str());
                let mut attempt = 1;
                loop {
                    let suffix = if attempt == 1 {
                        tag.to_string()
                    } else {
                        format!("{}-{}", tag, attempt)
                    };
                    name = sanitize_component(&format!(
                        "{} ({}).{}",
                        file_stem(episode),
                        suffix,
                        episode.container_extension
                    ));
                    if taken.insert(name.to_lowercase()) {
                        break;
                    }
                    attempt += 1;
                }
            }
            name
        })
        .collect()
}
