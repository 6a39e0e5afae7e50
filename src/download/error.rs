//! Error types for the download module.
//!
//! Every variant describes why a single URL produced no saved file. None of
//! them abort a batch; they are collected into a
//! [`BatchReport`](super::BatchReport) and logged.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading a single image.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response (after the session's automatic retries).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error (create directory, create file, write, stat).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// Neither the Content-Type nor the filename extension indicates an image.
    #[error("non-image content for {url} (content-type: '{content_type}')")]
    NotAnImage {
        /// The rejected URL.
        url: String,
        /// The Content-Type header value (empty if absent).
        content_type: String,
    },

    /// The response body was empty; the file was removed.
    #[error("empty payload for {url}")]
    EmptyPayload {
        /// The rejected URL.
        url: String,
    },

    /// The payload is smaller than the enforced minimum; the file was removed.
    #[error("payload for {url} is {bytes} bytes, below the {min_bytes}-byte minimum")]
    BelowMinimumSize {
        /// The rejected URL.
        url: String,
        /// Size of the payload in bytes.
        bytes: u64,
        /// The enforced minimum.
        min_bytes: u64,
    },
}

impl DownloadError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn from_request(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a non-image rejection.
    pub fn not_an_image(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::NotAnImage {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Returns true if the payload was fetched but rejected by validation
    /// (content type or size gating).
    #[must_use]
    pub fn is_validation_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotAnImage { .. } | Self::EmptyPayload { .. } | Self::BelowMinimumSize { .. }
        )
    }
}
