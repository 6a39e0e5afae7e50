//! Bounded-concurrency downloader for one page's images.
//!
//! # Concurrency Model
//!
//! - Input URLs are deduplicated (first occurrence wins) into a shared queue
//! - Exactly `concurrency` worker tasks are spawned; each takes one URL at a
//!   time and processes it to completion before taking the next
//! - Outcomes are sent over a channel and aggregated by the caller's task
//! - A failing URL (or a panicking worker) never cancels its siblings
//!
//! # Example
//!
//! ```no_run
//! use bulk_image_downloader::download::Downloader;
//! use bulk_image_downloader::session::{SessionConfig, build_session};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = build_session(SessionConfig::default())?;
//! let downloader = Downloader::new(session, 8);
//! let urls = vec!["https://example.com/a.png".to_string()];
//! let report = downloader.download_all(&urls, Path::new("./downloads")).await?;
//! println!("saved: {}, failed: {}", report.saved.len(), report.failed.len());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::DownloadError;
use super::filename::derive_filename;
use crate::media::{has_image_extension, is_image_content_type};
use crate::session::Session;

/// Default number of concurrent workers.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Write buffer size; the body is flushed to disk in chunks of this size.
const CHUNK_SIZE: usize = 64 * 1024;

/// One successfully saved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Where the image was written.
    pub path: PathBuf,
    /// The URL it was fetched from.
    pub source_url: String,
    /// Size of the saved file in bytes (always > 0).
    pub bytes: u64,
}

/// A URL that produced no saved file, with the reason.
#[derive(Debug)]
pub struct DownloadFailure {
    /// The URL that failed.
    pub url: String,
    /// Why it failed.
    pub error: DownloadError,
}

/// Outcome of a batch: saved files plus per-URL failures.
///
/// Entries appear in completion order, which is not deterministic.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully saved images.
    pub saved: Vec<DownloadResult>,
    /// URLs that produced no file.
    pub failed: Vec<DownloadFailure>,
}

impl BatchReport {
    /// Total number of URLs attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.failed.len()
    }
}

/// Downloads image URLs into a destination directory with a fixed-size
/// worker pool sharing one [`Session`].
#[derive(Debug, Clone)]
pub struct Downloader {
    session: Session,
    concurrency: usize,
    min_image_bytes: Option<u64>,
}

impl Downloader {
    /// Creates a downloader with `concurrency` workers (values below 1 are
    /// raised to 1).
    #[must_use]
    pub fn new(session: Session, concurrency: usize) -> Self {
        Self {
            session,
            concurrency: concurrency.max(1),
            min_image_bytes: None,
        }
    }

    /// Enforces a minimum payload size. `None` keeps the zero-byte check only.
    #[must_use]
    pub fn with_min_image_bytes(mut self, min_image_bytes: Option<u64>) -> Self {
        self.min_image_bytes = min_image_bytes;
        self
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Downloads every distinct URL and returns the saved files.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] only if `dest_dir` cannot be created.
    /// Per-URL failures are logged and omitted from the result.
    pub async fn download_many<S: AsRef<str>>(
        &self,
        urls: &[S],
        dest_dir: &Path,
    ) -> Result<Vec<DownloadResult>, DownloadError> {
        Ok(self.download_all(urls, dest_dir).await?.saved)
    }

    /// Downloads every distinct URL and reports successes and failures.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] only if `dest_dir` cannot be created.
    #[instrument(skip(self, urls), fields(dest = %dest_dir.display(), concurrency = self.concurrency))]
    pub async fn download_all<S: AsRef<str>>(
        &self,
        urls: &[S],
        dest_dir: &Path,
    ) -> Result<BatchReport, DownloadError> {
        let unique = dedup_urls(urls);
        let mut report = BatchReport::default();
        if unique.is_empty() {
            return Ok(report);
        }

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| DownloadError::io(dest_dir, e))?;

        debug!(
            requested = urls.len(),
            unique = unique.len(),
            "starting download batch"
        );

        let queue = Arc::new(Mutex::new(VecDeque::from(unique)));
        let dest_dir = Arc::new(dest_dir.to_path_buf());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut workers = JoinSet::new();

        for worker in 0..self.concurrency {
            let queue = Arc::clone(&queue);
            let dest_dir = Arc::clone(&dest_dir);
            let session = self.session.clone();
            let tx = tx.clone();
            let min_image_bytes = self.min_image_bytes;

            workers.spawn(async move {
                while let Some(url) = next_url(&queue) {
                    debug!(worker, url = %url, "worker picked up URL");
                    let outcome = download_one(&session, &url, &dest_dir, min_image_bytes).await;
                    if tx.send((url, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        // Only workers hold senders now; the channel closes when they finish.
        drop(tx);

        while let Some((url, outcome)) = rx.recv().await {
            match outcome {
                Ok(saved) => {
                    debug!(url = %url, path = %saved.path.display(), bytes = saved.bytes, "image saved");
                    report.saved.push(saved);
                }
                Err(error) => {
                    if error.is_validation_rejection() {
                        debug!(url = %url, error = %error, "image rejected");
                    } else {
                        warn!(url = %url, error = %error, "image download failed");
                    }
                    report.failed.push(DownloadFailure { url, error });
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "download worker panicked");
            }
        }

        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "download batch complete"
        );
        Ok(report)
    }
}

/// Downloads `urls` into `dest_dir` with `concurrency` workers and returns
/// the saved files.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] only if `dest_dir` cannot be created.
pub async fn download_many<S: AsRef<str>>(
    urls: &[S],
    dest_dir: &Path,
    session: &Session,
    concurrency: usize,
) -> Result<Vec<DownloadResult>, DownloadError> {
    Downloader::new(session.clone(), concurrency)
        .download_many(urls, dest_dir)
        .await
}

/// Removes duplicate URLs, keeping the first occurrence and input order.
#[must_use]
pub fn dedup_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(AsRef::as_ref)
        .filter(|url| seen.insert(*url))
        .map(str::to_string)
        .collect()
}

fn next_url(queue: &Mutex<VecDeque<String>>) -> Option<String> {
    queue
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .pop_front()
}

/// Fetches one URL and writes it under `dest_dir`.
///
/// The body is streamed to a per-URL part file and renamed onto the derived
/// path only once it passes the size checks. On failure only that part file
/// is removed.
#[instrument(skip(session, dest_dir, min_image_bytes))]
async fn download_one(
    session: &Session,
    url: &str,
    dest_dir: &Path,
    min_image_bytes: Option<u64>,
) -> Result<DownloadResult, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    let filename = derive_filename(&parsed);
    let target = dest_dir.join(&filename);

    let response = session
        .get_streamed(parsed.as_str())
        .await
        .map_err(|e| DownloadError::from_request(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::http_status(url, status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !is_image_content_type(&content_type) && !has_image_extension(&filename) {
        return Err(DownloadError::not_an_image(url, content_type));
    }

    // Only a body that passes the size checks ever reaches `target`.
    let part = part_path(dest_dir, &filename);
    let bytes = stream_to_file(response, url, &part).await?;

    if bytes == 0 {
        remove_quietly(&part).await;
        return Err(DownloadError::EmptyPayload {
            url: url.to_string(),
        });
    }
    if let Some(min_bytes) = min_image_bytes
        && bytes < min_bytes
    {
        remove_quietly(&part).await;
        return Err(DownloadError::BelowMinimumSize {
            url: url.to_string(),
            bytes,
            min_bytes,
        });
    }

    if let Err(e) = tokio::fs::rename(&part, &target).await {
        remove_quietly(&part).await;
        return Err(DownloadError::io(&target, e));
    }

    Ok(DownloadResult {
        path: target,
        source_url: url.to_string(),
        bytes,
    })
}

/// Unique hidden sibling of `filename` inside `dest_dir` for an in-flight body.
fn part_path(dest_dir: &Path, filename: &str) -> PathBuf {
    static NEXT_PART: AtomicU64 = AtomicU64::new(0);
    let seq = NEXT_PART.fetch_add(1, Ordering::Relaxed);
    dest_dir.join(format!(".{filename}.{}-{seq}.part", std::process::id()))
}

/// Streams the response body to `file_path`, removing the partial file on error.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    let result = write_body(file, response, url, file_path).await;
    if result.is_err() {
        debug!(path = %file_path.display(), "cleaning up partial file after error");
        remove_quietly(file_path).await;
    }
    result
}

async fn write_body(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::from_request(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!(path = %path.display(), error = %e, "could not remove rejected file");
    }
}
