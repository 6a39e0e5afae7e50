//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::time::Duration;

use bulk_image_downloader::{RetryPolicy, Session, SessionConfig, build_session};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Smallest valid PNG signature plus padding; content is irrelevant to the
/// downloader beyond being non-empty.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n-fake-image-body-";

/// Session with the default retry count but millisecond backoff so retry
/// tests stay fast.
pub fn fast_session() -> Session {
    let config = SessionConfig::default()
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)));
    build_session(config).expect("session should build")
}

/// Session that never retries.
pub fn no_retry_session() -> Session {
    let config = SessionConfig::default()
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::no_retries());
    build_session(config).expect("session should build")
}

/// Mounts a GET route returning `body` with `content_type`.
pub async fn mount_get(server: &MockServer, route: &str, content_type: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", content_type)
                .set_body_bytes(body.to_vec()),
        )
        .mount(server)
        .await;
}

/// Mounts a GET route returning an HTML page.
pub async fn mount_page(server: &MockServer, route: &str, html: &str) {
    mount_get(server, route, "text/html; charset=utf-8", html.as_bytes()).await;
}

/// Mounts a GET route returning a PNG body.
pub async fn mount_png(server: &MockServer, route: &str) {
    mount_get(server, route, "image/png", PNG_BYTES).await;
}

/// Mounts a HEAD route answering with `content_type`.
pub async fn mount_head(server: &MockServer, route: &str, content_type: &str) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", content_type))
        .mount(server)
        .await;
}
