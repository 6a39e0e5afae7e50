//! Image URL collection from a single page.
//!
//! Collection runs in five steps:
//!
//! 1. Fetch the page (GET, 20s timeout). Any failure yields no candidates.
//! 2. Extract raw candidates from `<img src>`, `<img srcset>`, and inline
//!    `style` `url(...)` references (see [`extract`]).
//! 3. Resolve each candidate against the page URL.
//! 4. Drop non-http(s) and `data:image/...` references, then deduplicate
//!    keeping first-seen order.
//! 5. Accept candidates with a known image extension outright; confirm the
//!    rest with a HEAD probe (10s timeout) whose Content-Type must mention
//!    `image`.

mod error;
pub mod extract;

use std::collections::HashSet;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::CollectError;
pub use extract::{ExtractionRule, extract_candidates, parse_srcset, parse_style_urls};

use crate::media::{is_data_image_url, is_image_content_type, url_has_image_extension};
use crate::session::Session;

/// Timeout for the page fetch.
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Timeout for each HEAD probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum HEAD probes in flight for one page.
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

/// An extracted reference and its absolute form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    /// The string as it appeared in the markup.
    pub raw: String,
    /// The reference resolved against the page URL.
    pub url: Url,
}

impl ImageCandidate {
    /// Returns true if the path already identifies an image by extension.
    #[must_use]
    pub fn has_image_extension(&self) -> bool {
        url_has_image_extension(&self.url)
    }
}

/// Collects validated image URLs from pages using a shared [`Session`].
#[derive(Debug, Clone)]
pub struct ImageCollector {
    session: Session,
    page_timeout: Duration,
    probe_timeout: Duration,
    probe_concurrency: usize,
}

impl ImageCollector {
    /// Creates a collector with the default page and probe timeouts.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            page_timeout: PAGE_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            probe_concurrency: DEFAULT_PROBE_CONCURRENCY,
        }
    }

    /// Overrides the page fetch and probe timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, page_timeout: Duration, probe_timeout: Duration) -> Self {
        self.page_timeout = page_timeout;
        self.probe_timeout = probe_timeout;
        self
    }

    /// Overrides the number of concurrent HEAD probes (minimum 1).
    #[must_use]
    pub fn with_probe_concurrency(mut self, probe_concurrency: usize) -> Self {
        self.probe_concurrency = probe_concurrency.max(1);
        self
    }

    /// Collects image URLs, logging any page-level failure and returning an
    /// empty list in that case.
    #[instrument(skip(self))]
    pub async fn collect(&self, page_url: &str) -> Vec<String> {
        match self.try_collect(page_url).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(page = %page_url, error = %e, "failed to collect image URLs");
                Vec::new()
            }
        }
    }

    /// Collects image URLs, surfacing page-level failures.
    ///
    /// Individual candidates that fail validation are dropped silently (and
    /// logged at debug level); they never turn into an error.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] if the page URL is invalid, the page fetch
    /// fails, or the page responds with a non-2xx status.
    pub async fn try_collect(&self, page_url: &str) -> Result<Vec<String>, CollectError> {
        let base = parse_page_url(page_url)?;

        let response = self
            .session
            .get(base.as_str(), self.page_timeout)
            .await
            .map_err(|e| CollectError::from_request(page_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::HttpStatus {
                url: page_url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| CollectError::from_request(page_url, e))?;

        let raw = extract_candidates(&body);
        let candidates = resolve_candidates(&base, raw.iter().map(String::as_str));
        let extracted = raw.len();
        let resolved = candidates.len();

        let validated = self.validate(candidates).await;

        info!(
            page = %page_url,
            extracted,
            resolved,
            validated = validated.len(),
            "collected image URLs"
        );
        Ok(validated)
    }

    /// Keeps candidates that carry an image extension or pass a HEAD probe,
    /// preserving input order.
    async fn validate(&self, candidates: Vec<ImageCandidate>) -> Vec<String> {
        stream::iter(candidates)
            .map(|candidate| async move {
                let accepted =
                    candidate.has_image_extension() || self.probe(&candidate.url).await;
                accepted.then(|| candidate.url.to_string())
            })
            .buffered(self.probe_concurrency)
            .filter_map(std::future::ready)
            .collect()
            .await
    }

    async fn probe(&self, url: &Url) -> bool {
        match self.session.head(url.as_str(), self.probe_timeout).await {
            Ok(response) => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                let accepted = is_image_content_type(content_type);
                if !accepted {
                    debug!(url = %url, content_type, "probe rejected non-image candidate");
                }
                accepted
            }
            Err(e) => {
                debug!(url = %url, error = %e, "probe failed, rejecting candidate");
                false
            }
        }
    }
}

/// Collects validated image URLs from `page_url` with default timeouts.
///
/// Failures are logged and yield an empty list.
pub async fn collect_image_urls(page_url: &str, session: &Session) -> Vec<String> {
    ImageCollector::new(session.clone()).collect(page_url).await
}

/// Resolves raw references against `base`, drops unfetchable ones, and
/// deduplicates by absolute URL keeping first-seen order.
///
/// # Examples
///
/// ```
/// use bulk_image_downloader::collector::resolve_candidates;
/// use url::Url;
///
/// let base = Url::parse("https://ex.com/page").unwrap();
/// let resolved = resolve_candidates(&base, ["/a.png", "a.png", "data:image/png;base64,AAAA"]);
/// assert_eq!(resolved.len(), 1);
/// assert_eq!(resolved[0].url.as_str(), "https://ex.com/a.png");
/// ```
pub fn resolve_candidates<'a>(
    base: &Url,
    raw: impl IntoIterator<Item = &'a str>,
) -> Vec<ImageCandidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for reference in raw {
        let reference = reference.trim();
        if reference.is_empty() || is_data_image_url(reference) {
            continue;
        }
        let Ok(url) = base.join(reference) else {
            debug!(reference, "unresolvable reference");
            continue;
        };
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        if seen.insert(url.as_str().to_owned()) {
            candidates.push(ImageCandidate {
                raw: reference.to_string(),
                url,
            });
        }
    }

    candidates
}

fn parse_page_url(page_url: &str) -> Result<Url, CollectError> {
    let url = Url::parse(page_url.trim()).map_err(|_| CollectError::InvalidUrl {
        url: page_url.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(CollectError::Parse {
            url: page_url.to_string(),
            reason: "URL cannot serve as a base for relative references".to_string(),
        });
    }
    Ok(url)
}
