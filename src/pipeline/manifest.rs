//! Run manifest: which archive each processed page produced.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::PipelineError;

/// One archived page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifestEntry {
    /// The page URL.
    pub url: String,
    /// The page identifier used for workspace and archive names.
    #[serde(rename = "urlHash")]
    pub url_hash: String,
    /// Absolute path of the page archive.
    pub download: String,
}

/// Writes `entries` to `path` as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`PipelineError::Manifest`] on serialization failure or
/// [`PipelineError::Io`] if the file cannot be written.
pub async fn write_manifest(path: &Path, entries: &[RunManifestEntry]) -> Result<(), PipelineError> {
    let json = serde_json::to_string_pretty(entries).map_err(|source| PipelineError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::io(parent, e))?;
    }
    tokio::fs::write(path, json)
        .await
        .map_err(|e| PipelineError::io(path, e))
}
