//! Integration tests for the concurrent downloader.
//!
//! These tests verify the full download flow with mock HTTP servers.

mod support;

use std::collections::HashSet;
use std::time::{Duration, Instant};

use bulk_image_downloader::download::{DownloadError, Downloader, download_many};
use support::{PNG_BYTES, fast_session, mount_get, mount_png, no_retry_session};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_download_many_saves_files_with_content() {
    let server = MockServer::start().await;
    mount_png(&server, "/img/a.png").await;
    mount_png(&server, "/img/b.png").await;
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let urls = vec![
        format!("{}/img/a.png", server.uri()),
        format!("{}/img/b.png?w=300", server.uri()),
    ];
    let saved = download_many(&urls, temp_dir.path(), &fast_session(), 2)
        .await
        .expect("destination is writable");

    assert_eq!(saved.len(), 2);
    for item in &saved {
        assert!(item.path.starts_with(temp_dir.path()));
        assert_eq!(std::fs::read(&item.path).unwrap(), PNG_BYTES);
        assert_eq!(item.bytes, PNG_BYTES.len() as u64);
    }
    let names: HashSet<_> = saved
        .iter()
        .map(|r| r.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, HashSet::from(["a.png".to_string(), "b.png".to_string()]));
}

#[tokio::test]
async fn test_two_failures_out_of_ten_leave_eight_results() {
    let server = MockServer::start().await;
    let mut urls = Vec::new();
    for i in 0..8 {
        let route = format!("/ok/{i}.png");
        mount_png(&server, &route).await;
        urls.push(format!("{}{route}", server.uri()));
    }
    for i in 0..2 {
        let route = format!("/missing/{i}.png");
        Mock::given(method("GET"))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        urls.insert(i * 4, format!("{}{route}", server.uri()));
    }
    let temp_dir = TempDir::new().unwrap();

    let report = Downloader::new(fast_session(), 3)
        .download_all(&urls, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 8);
    assert_eq!(report.failed.len(), 2);
    assert!(
        report
            .failed
            .iter()
            .all(|f| matches!(f.error, DownloadError::HttpStatus { status: 404, .. }))
    );
}

#[tokio::test]
async fn test_duplicate_urls_are_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dup.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(PNG_BYTES.to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let url = format!("{}/dup.png", server.uri());

    let saved = download_many(
        &[url.clone(), url.clone(), url],
        temp_dir.path(),
        &fast_session(),
        3,
    )
    .await
    .unwrap();

    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn test_html_without_image_extension_is_rejected() {
    let server = MockServer::start().await;
    mount_get(&server, "/viewer", "text/html", b"<html>not an image</html>").await;
    let temp_dir = TempDir::new().unwrap();

    let report = Downloader::new(fast_session(), 1)
        .download_all(&[format!("{}/viewer", server.uri())], temp_dir.path())
        .await
        .unwrap();

    assert!(report.saved.is_empty());
    assert!(matches!(
        report.failed[0].error,
        DownloadError::NotAnImage { .. }
    ));
    assert!(!temp_dir.path().join("viewer.bin").exists());
}

#[tokio::test]
async fn test_image_extension_accepted_despite_generic_content_type() {
    let server = MockServer::start().await;
    mount_get(&server, "/raw/pic.gif", "application/octet-stream", b"GIF89a...").await;
    let temp_dir = TempDir::new().unwrap();

    let saved = download_many(
        &[format!("{}/raw/pic.gif", server.uri())],
        temp_dir.path(),
        &fast_session(),
        1,
    )
    .await
    .unwrap();

    assert_eq!(saved.len(), 1);
    assert!(saved[0].path.ends_with("pic.gif"));
}

#[tokio::test]
async fn test_extensionless_image_gets_bin_name() {
    let server = MockServer::start().await;
    mount_get(&server, "/render/42", "image/jpeg", b"\xff\xd8\xff\xe0jpeg").await;
    let temp_dir = TempDir::new().unwrap();

    let saved = download_many(
        &[format!("{}/render/42", server.uri())],
        temp_dir.path(),
        &fast_session(),
        1,
    )
    .await
    .unwrap();

    assert_eq!(saved.len(), 1);
    assert!(saved[0].path.ends_with("42.bin"));
}

#[tokio::test]
async fn test_empty_payload_leaves_no_file() {
    let server = MockServer::start().await;
    mount_get(&server, "/empty.png", "image/png", b"").await;
    let temp_dir = TempDir::new().unwrap();

    let report = Downloader::new(fast_session(), 1)
        .download_all(&[format!("{}/empty.png", server.uri())], temp_dir.path())
        .await
        .unwrap();

    assert!(report.saved.is_empty());
    assert!(matches!(
        report.failed[0].error,
        DownloadError::EmptyPayload { .. }
    ));
    assert!(!temp_dir.path().join("empty.png").exists());
}

#[tokio::test]
async fn test_rejected_url_keeps_saved_file_with_same_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .and(query_param("v", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(PNG_BYTES.to_vec()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a.png"))
        .and(query_param("v", "2"))
        .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/a.png?v=1", server.uri()),
        format!("{}/a.png?v=2", server.uri()),
    ];

    let report = Downloader::new(fast_session(), 1)
        .download_all(&urls, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 1);
    assert!(matches!(
        report.failed[0].error,
        DownloadError::EmptyPayload { .. }
    ));
    for item in &report.saved {
        assert_eq!(std::fs::read(&item.path).unwrap(), PNG_BYTES);
    }
    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "part files left behind: {leftovers:?}");
}

#[tokio::test]
async fn test_minimum_size_is_enforced_only_when_configured() {
    let server = MockServer::start().await;
    mount_png(&server, "/small.png").await;
    let url = format!("{}/small.png", server.uri());

    let loose = TempDir::new().unwrap();
    let saved = Downloader::new(fast_session(), 1)
        .download_many(&[url.clone()], loose.path())
        .await
        .unwrap();
    assert_eq!(saved.len(), 1);

    let strict = TempDir::new().unwrap();
    let report = Downloader::new(fast_session(), 1)
        .with_min_image_bytes(Some(1024))
        .download_all(&[url], strict.path())
        .await
        .unwrap();
    assert!(report.saved.is_empty());
    assert!(matches!(
        report.failed[0].error,
        DownloadError::BelowMinimumSize { min_bytes: 1024, .. }
    ));
    assert!(!strict.path().join("small.png").exists());
}

#[tokio::test]
async fn test_server_error_is_retried_before_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.png"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_png(&server, "/flaky.png").await;
    let temp_dir = TempDir::new().unwrap();

    let saved = download_many(
        &[format!("{}/flaky.png", server.uri())],
        temp_dir.path(),
        &fast_session(),
        1,
    )
    .await
    .unwrap();

    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn test_slow_url_does_not_block_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(PNG_BYTES.to_vec())
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    for i in 0..4 {
        mount_png(&server, &format!("/fast/{i}.png")).await;
    }
    let mut urls = vec![format!("{}/slow.png", server.uri())];
    urls.extend((0..4).map(|i| format!("{}/fast/{i}.png", server.uri())));
    let temp_dir = TempDir::new().unwrap();

    let report = Downloader::new(no_retry_session(), 2)
        .download_all(&urls, temp_dir.path())
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 5);
    // Completion order: the slow image finishes last.
    assert_eq!(report.saved.last().unwrap().source_url, urls[0]);
}

#[tokio::test]
async fn test_worker_pool_caps_requests_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(PNG_BYTES.to_vec())
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    let urls: Vec<String> = (0..10)
        .map(|i| format!("{}/pool/{i}.png", server.uri()))
        .collect();
    let temp_dir = TempDir::new().unwrap();
    let dest = temp_dir.path().to_path_buf();
    let downloader = Downloader::new(no_retry_session(), 3);

    let started = Instant::now();
    let batch = tokio::spawn(async move { downloader.download_all(&urls, &dest).await });

    // Every response is held for 400ms, so only the first wave has arrived.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let in_flight = server.received_requests().await.unwrap().len();
    assert_eq!(in_flight, 3);

    let report = batch.await.unwrap().unwrap();
    assert_eq!(report.saved.len(), 10);
    assert_eq!(server.received_requests().await.unwrap().len(), 10);
    // Ten URLs over three workers take four waves.
    assert!(started.elapsed() >= Duration::from_millis(1600));
}

#[tokio::test]
async fn test_invalid_url_is_reported_not_fatal() {
    let server = MockServer::start().await;
    mount_png(&server, "/a.png").await;
    let temp_dir = TempDir::new().unwrap();

    let report = Downloader::new(fast_session(), 2)
        .download_all(
            &["::garbage::".to_string(), format!("{}/a.png", server.uri())],
            temp_dir.path(),
        )
        .await
        .unwrap();

    assert_eq!(report.saved.len(), 1);
    assert!(matches!(
        report.failed[0].error,
        DownloadError::InvalidUrl { .. }
    ));
}

#[tokio::test]
async fn test_unwritable_destination_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let result = download_many(
        &["https://ex.invalid/a.png"],
        &blocker.join("sub"),
        &fast_session(),
        1,
    )
    .await;

    assert!(matches!(result, Err(DownloadError::Io { .. })));
}
