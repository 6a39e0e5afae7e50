//! Error types for session construction.

use thiserror::Error;

/// Errors raised while building a [`Session`](super::Session).
///
/// These are configuration errors: they surface before any network activity
/// and are fatal to the run.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A configured proxy endpoint is not a usable URL.
    #[error("invalid {scheme} proxy URL '{url}': {reason}")]
    InvalidProxy {
        /// Traffic scheme the proxy was configured for (`http` or `https`).
        scheme: &'static str,
        /// The rejected proxy value.
        url: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The request timeout is zero.
    #[error("invalid timeout: must be greater than zero")]
    InvalidTimeout,

    /// A default header value (e.g. the User-Agent) contains illegal characters.
    #[error("invalid value for header {name}: {source}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
        /// The underlying header error.
        #[source]
        source: reqwest::header::InvalidHeaderValue,
    },

    /// The HTTP client builder rejected the configuration.
    #[error("failed to build HTTP client: {source}")]
    Build {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl SessionError {
    /// Creates an invalid proxy error.
    pub fn invalid_proxy(
        scheme: &'static str,
        url: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidProxy {
            scheme,
            url: url.into(),
            reason: reason.into(),
        }
    }
}
