//! Session construction and retry-aware request dispatch.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT,
};
use reqwest::{Client, ClientBuilder, Method, Proxy, Response};
use tracing::{debug, info, instrument};
use url::Url;

use super::config::{ProxySettings, SessionConfig};
use super::error::SessionError;
use super::retry::RetryDecision;

/// Accept header sent with every request.
const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Accept-Language header sent with every request.
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Reusable HTTP client handle shared by all concurrent workers.
///
/// Cloning is cheap: the underlying connection pool and the configuration are
/// reference counted, and neither is mutated after [`build_session`].
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    config: Arc<SessionConfig>,
}

/// Builds a [`Session`] from `config`.
///
/// # Errors
///
/// Returns a [`SessionError`] if the timeout is zero, a default header value
/// is malformed, a proxy endpoint is not a valid http(s) URL, or the client
/// builder fails.
#[instrument(level = "debug", skip(config), fields(use_proxies = config.proxies.use_proxies))]
pub fn build_session(config: SessionConfig) -> Result<Session, SessionError> {
    if config.timeout.is_zero() {
        return Err(SessionError::InvalidTimeout);
    }

    let headers = default_headers(&config.user_agent)?;
    let builder = Client::builder()
        .default_headers(headers)
        .connect_timeout(config.timeout)
        .read_timeout(config.timeout)
        .pool_max_idle_per_host(config.pool_size)
        .gzip(true);
    let builder = apply_proxies(builder, &config.proxies)?;
    let client = builder
        .build()
        .map_err(|source| SessionError::Build { source })?;

    info!(
        timeout_secs = config.timeout.as_secs(),
        pool_size = config.pool_size,
        max_retries = config.retry.max_retries(),
        proxied = config.proxies.is_active(),
        "HTTP session ready"
    );

    Ok(Session {
        client,
        config: Arc::new(config),
    })
}

impl Session {
    /// Returns the configuration this session was built from.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sends a GET with an explicit total timeout, retrying transient
    /// server errors per the session's retry policy.
    ///
    /// The final response is returned whatever its status; callers decide
    /// what a non-2xx status means for them.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` on network failure, timeout,
    /// or an unparseable URL.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<Response, reqwest::Error> {
        self.send(Method::GET, url, Some(timeout)).await
    }

    /// Sends a HEAD with an explicit total timeout, following redirects.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn head(&self, url: &str, timeout: Duration) -> Result<Response, reqwest::Error> {
        self.send(Method::HEAD, url, Some(timeout)).await
    }

    /// Sends a GET whose body is meant to be streamed.
    ///
    /// Only the session's connect and per-read timeouts apply, so large
    /// bodies are not cut off as long as data keeps arriving.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn get_streamed(&self, url: &str) -> Result<Response, reqwest::Error> {
        self.send(Method::GET, url, None).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Response, reqwest::Error> {
        let mut retries_done = 0;
        loop {
            let mut request = self.client.request(method.clone(), url);
            if let Some(timeout) = timeout {
                request = request.timeout(timeout);
            }
            let response = request.send().await?;

            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);

            match self
                .config
                .retry
                .decide(&method, status, retries_done, retry_after.as_deref())
            {
                RetryDecision::Done => return Ok(response),
                RetryDecision::Retry { delay, retry } => {
                    debug!(
                        url,
                        %method,
                        status,
                        retry,
                        delay_ms = delay.as_millis(),
                        "retrying request"
                    );
                    drop(response);
                    tokio::time::sleep(delay).await;
                    retries_done = retry;
                }
            }
        }
    }
}

fn default_headers(user_agent: &str) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(user_agent).map_err(|source| {
        SessionError::InvalidHeader {
            name: "User-Agent",
            source,
        }
    })?;
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    Ok(headers)
}

/// Routes traffic through the configured proxies, or disables proxying
/// entirely so the session depends on nothing but its configuration.
fn apply_proxies(
    builder: ClientBuilder,
    proxies: &ProxySettings,
) -> Result<ClientBuilder, SessionError> {
    if !proxies.use_proxies {
        return Ok(builder.no_proxy());
    }

    let mut builder = builder.no_proxy();
    if let Some(raw) = proxies.http.as_deref() {
        let endpoint = validate_proxy_url("http", raw)?;
        let proxy = Proxy::http(endpoint.as_str())
            .map_err(|e| SessionError::invalid_proxy("http", raw, e.to_string()))?;
        builder = builder.proxy(proxy);
    }
    if let Some(raw) = proxies.https.as_deref() {
        let endpoint = validate_proxy_url("https", raw)?;
        let proxy = Proxy::https(endpoint.as_str())
            .map_err(|e| SessionError::invalid_proxy("https", raw, e.to_string()))?;
        builder = builder.proxy(proxy);
    }
    Ok(builder)
}

fn validate_proxy_url(scheme: &'static str, raw: &str) -> Result<Url, SessionError> {
    let url =
        Url::parse(raw.trim()).map_err(|e| SessionError::invalid_proxy(scheme, raw, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SessionError::invalid_proxy(
            scheme,
            raw,
            format!("unsupported proxy scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(SessionError::invalid_proxy(scheme, raw, "missing host"));
    }
    Ok(url)
}
