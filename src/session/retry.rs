//! Retry policy with exponential backoff for transient server errors.
//!
//! The session consults [`RetryPolicy::decide`] after every response. Only
//! idempotent methods (GET, HEAD) are retried, and only for status codes in
//! the force list. The final response is always handed back to the caller,
//! never converted into an error.
//!
//! # Delay Calculation
//!
//! ```text
//! delay(n) = min(backoff_factor * 2^(n - 1), max_backoff)
//! ```
//!
//! where `n` is the 1-indexed retry number. With defaults the delays are
//! 0.5s, 1s, 2s. A `Retry-After` header on 413/429/503 replaces the computed
//! delay (still capped at `max_backoff`).

use std::time::{Duration, SystemTime};

use reqwest::Method;
use tracing::{debug, instrument};

/// Default number of retries after the initial request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff factor (500 milliseconds).
pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_millis(500);

/// Default cap for a single backoff delay.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Status codes retried by default.
const DEFAULT_STATUS_FORCELIST: [u16; 5] = [429, 500, 502, 503, 504];

/// Status codes for which a `Retry-After` header is honoured.
const RETRY_AFTER_STATUSES: [u16; 3] = [413, 429, 503];

/// Decision on whether to retry after a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the request again after the delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// The 1-indexed retry number this will be.
        retry: u32,
    },

    /// Hand the response to the caller.
    Done,
}

/// Automatic retry configuration.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `backoff_factor`: 500ms
/// - `max_backoff`: 120s
/// - `status_forcelist`: 429, 500, 502, 503, 504
/// - `allowed_methods`: GET, HEAD
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: Duration,
    max_backoff: Duration,
    status_forcelist: Vec<u16>,
    allowed_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            max_backoff: DEFAULT_MAX_BACKOFF,
            status_forcelist: DEFAULT_STATUS_FORCELIST.to_vec(),
            allowed_methods: vec![Method::GET, Method::HEAD],
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom retry count and backoff factor, using
    /// defaults for the status force list and allowed methods.
    #[must_use]
    pub fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replaces the set of retryable status codes.
    #[must_use]
    pub fn with_status_forcelist(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.status_forcelist = statuses.into_iter().collect();
        self
    }

    /// Replaces the set of retryable methods.
    #[must_use]
    pub fn with_allowed_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.allowed_methods = methods.into_iter().collect();
        self
    }

    /// Returns the maximum number of retries after the initial request.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the configured backoff factor.
    #[must_use]
    pub fn backoff_factor(&self) -> Duration {
        self.backoff_factor
    }

    /// Returns true if `status` is in the force list.
    #[must_use]
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Returns true if requests with `method` may be retried.
    #[must_use]
    pub fn is_retryable_method(&self, method: &Method) -> bool {
        self.allowed_methods.contains(method)
    }

    /// Decides whether a response should be retried.
    ///
    /// # Arguments
    ///
    /// * `method` - Method of the request that produced the response
    /// * `status` - Response status code
    /// * `retries_done` - Number of retries already performed for this request
    /// * `retry_after` - Raw `Retry-After` header value, if present
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn decide(
        &self,
        method: &Method,
        status: u16,
        retries_done: u32,
        retry_after: Option<&str>,
    ) -> RetryDecision {
        if !self.is_retryable_method(method) || !self.is_retryable_status(status) {
            return RetryDecision::Done;
        }

        if retries_done >= self.max_retries {
            debug!(retries_done, status, "retries exhausted");
            return RetryDecision::Done;
        }

        let retry = retries_done + 1;
        let server_delay = retry_after
            .filter(|_| RETRY_AFTER_STATUSES.contains(&status))
            .and_then(parse_retry_after);
        let delay = server_delay
            .map_or_else(|| self.delay_for_retry(retry), |d| d.min(self.max_backoff));

        debug!(
            retry,
            status,
            delay_ms = delay.as_millis(),
            using_retry_after = server_delay.is_some(),
            "will retry"
        );

        RetryDecision::Retry { delay, retry }
    }

    /// Backoff before the `retry`-th retry (1-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.backoff_factor.as_secs_f64() * 2f64.powi(exponent);
        if !delay_secs.is_finite() || delay_secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(delay_secs)
    }
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date).
///
/// Returns `None` for negative or unparseable values. A date in the past
/// yields a zero delay.
///
/// # Examples
///
/// ```
/// use bulk_image_downloader::session::parse_retry_after;
/// use std::time::Duration;
///
/// assert_eq!(parse_retry_after("3"), Some(Duration::from_secs(3)));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    let datetime = httpdate::parse_http_date(header_value).ok()?;
    Some(
        datetime
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO),
    )
}
