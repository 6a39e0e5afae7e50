//! Bulk Image Downloader Library
//!
//! Crawls a list of web pages, extracts candidate image URLs from each page's
//! markup, downloads the validated images concurrently, and bundles each
//! page's images into a per-page archive.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`session`] - Shared HTTP session (proxies, default headers, retry policy)
//! - [`collector`] - Image URL extraction and validation from page markup
//! - [`download`] - Bounded-concurrency image downloader
//! - [`pipeline`] - Per-page orchestration: collect, download, archive, manifest
//! - [`settings`] - Settings file loading and environment overrides
//!
//! # Example
//!
//! ```no_run
//! use bulk_image_downloader::{SessionConfig, build_session, collect_image_urls, download_many};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = build_session(SessionConfig::default())?;
//! let urls = collect_image_urls("https://example.com/gallery", &session).await;
//! let saved = download_many(&urls, Path::new("./downloads"), &session, 8).await?;
//! println!("saved {} images", saved.len());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collector;
pub mod download;
pub mod media;
pub mod pipeline;
pub mod session;
pub mod settings;
mod user_agent;

// Re-export commonly used types
pub use collector::{CollectError, ImageCollector, collect_image_urls};
pub use download::{
    BatchReport, DEFAULT_CONCURRENCY, DownloadError, DownloadResult, Downloader, download_many,
};
pub use pipeline::{PageTask, PipelineError, RunManifestEntry, RunPaths, RunSummary, run_pipeline};
pub use session::{ProxySettings, RetryPolicy, Session, SessionConfig, SessionError, build_session};
pub use settings::{Settings, SettingsError};
pub use user_agent::default_user_agent;
