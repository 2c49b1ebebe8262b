use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::types::Snapshot;
use super::CacheError;

/// Reads and writes the snapshot file.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing or unreadable file yields `None`.
    pub async fn load(&self) -> Option<Snapshot> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache snapshot at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Failed to read cache snapshot {}: {}",
                    self.path.display(),
                    e
                );
                return None;
            }
        };

        match serde_json::from_slice::<Snapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(
                    "Cache snapshot {} is empty or malformed, ignoring it: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Replace the snapshot file.
    ///
    /// The document goes to a sibling temp file first and is renamed over
    /// the target once flushed, so readers see either the old or the new
    /// snapshot.
    pub async fn save(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| CacheError::InvalidPath(self.path.display().to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp_name = OsString::from(file_name);
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let body = to_pretty_json(snapshot)?;

        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(&body).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp_path, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        debug!(
            "Saved cache snapshot to {} ({} series, {} bytes)",
            self.path.display(),
            snapshot.series.len(),
            body.len()
        );
        Ok(())
    }

    /// Number of cached series per category id.
    pub async fn series_count_by_category(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        if let Some(snapshot) = self.load().await {
            for series in snapshot.series.values() {
                if !series.category_id.is_empty() {
                    *counts.entry(series.category_id.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    pub async fn last_fetch_date(&self) -> Option<DateTime<Utc>> {
        self.load().await.map(|snapshot| snapshot.last_fetch_date)
    }
}

/// Pretty JSON with four-space indentation, non-ASCII kept verbatim.
fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}
