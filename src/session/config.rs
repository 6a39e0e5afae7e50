//! Immutable session configuration.

use std::time::Duration;

use serde::Deserialize;

use super::retry::RetryPolicy;
use crate::user_agent::default_user_agent;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default connection pool size (idle connections kept per host).
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Optional HTTP/HTTPS proxy endpoints.
///
/// Endpoints are only applied when `use_proxies` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    /// Master switch for proxy routing.
    pub use_proxies: bool,
    /// Proxy for plain `http://` traffic.
    pub http: Option<String>,
    /// Proxy for `https://` traffic.
    pub https: Option<String>,
}

impl ProxySettings {
    /// Returns true if routing is enabled and at least one endpoint is set.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.use_proxies && (self.http.is_some() || self.https.is_some())
    }
}

/// Configuration for a [`Session`](super::Session).
///
/// Constructed once per run and never mutated afterwards; the built session
/// keeps its own shared copy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Proxy routing.
    pub proxies: ProxySettings,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Default per-request timeout.
    pub timeout: Duration,
    /// Automatic retry policy for transient server errors.
    pub retry: RetryPolicy,
    /// Maximum idle connections kept per host.
    pub pool_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            proxies: ProxySettings::default(),
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

impl SessionConfig {
    /// Returns a copy with a different User-Agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns a copy with a different default timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a copy with a different retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns a copy with different proxy settings.
    #[must_use]
    pub fn with_proxies(mut self, proxies: ProxySettings) -> Self {
        self.proxies = proxies;
        self
    }
}
