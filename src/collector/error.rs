//! Error types for image URL collection.

use thiserror::Error;

/// Errors that can occur while collecting image URLs from a page.
///
/// All variants are non-fatal for a run: the page is logged and skipped.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The page URL could not be parsed.
    #[error("invalid page URL: {url}")]
    InvalidUrl {
        /// The rejected page URL.
        url: String,
    },

    /// Network-level failure fetching the page.
    #[error("network error fetching page {url}: {source}")]
    Network {
        /// The page URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The page fetch timed out.
    #[error("timeout fetching page {url}")]
    Timeout {
        /// The page URL.
        url: String,
    },

    /// The page responded with a non-2xx status (after retries).
    #[error("HTTP {status} fetching page {url}")]
    HttpStatus {
        /// The page URL.
        url: String,
        /// The final HTTP status code.
        status: u16,
    },

    /// The page could not be interpreted as a base for its references.
    #[error("cannot interpret page {url}: {reason}")]
    Parse {
        /// The page URL.
        url: String,
        /// Why interpretation failed.
        reason: String,
    },
}

impl CollectError {
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

    /// Returns true for fetch failures (network, timeout, HTTP status).
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }
}
