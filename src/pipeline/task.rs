//! Page tasks and their stable identifiers.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// One input page to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    url: String,
    hash: String,
}

impl PageTask {
    /// Creates a task for `url`, deriving its identifier.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let hash = url_hash(&url);
        Self { url, hash }
    }

    /// The page URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Lowercase hex SHA-256 of the page URL.
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Per-page workspace directory under `workspace_root`.
    #[must_use]
    pub fn workspace_dir(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.hash)
    }

    /// Archive path under `archives_dir`.
    #[must_use]
    pub fn archive_path(&self, archives_dir: &Path) -> PathBuf {
        archives_dir.join(format!("{}.zip", self.hash))
    }
}

/// Hashes a page URL into a filesystem-safe identifier.
#[must_use]
pub fn url_hash(url: &str) -> String {
    hex_encode(&Sha256::digest(url.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(HEX[usize::from(byte >> 4)]));
        out.push(char::from(HEX[usize::from(byte & 0x0f)]));
    }
    out
}
