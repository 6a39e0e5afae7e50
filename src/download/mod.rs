//! Concurrent image downloader.
//!
//! Streams each image URL to disk under a destination directory using a
//! fixed-size worker pool that shares one [`Session`](crate::session::Session).
//!
//! # Features
//!
//! - Duplicate input URLs are fetched once
//! - Streaming writes in 64 KiB chunks (memory-bounded for large files)
//! - Content-Type or filename extension must indicate an image
//! - Empty payloads (and, optionally, undersized ones) are removed
//! - Per-URL failures are logged and never abort the batch
//!
//! # Example
//!
//! ```no_run
//! use bulk_image_downloader::download::download_many;
//! use bulk_image_downloader::session::{SessionConfig, build_session};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = build_session(SessionConfig::default())?;
//! let urls = ["https://example.com/a.png", "https://example.com/b.jpg"];
//! let saved = download_many(&urls, Path::new("./downloads"), &session, 4).await?;
//! for image in saved {
//!     println!("{} -> {}", image.source_url, image.path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod filename;

pub use engine::{
    BatchReport, DEFAULT_CONCURRENCY, DownloadFailure, DownloadResult, Downloader, dedup_urls,
    download_many,
};
pub use error::DownloadError;
pub use filename::{DEFAULT_EXTENSION, DEFAULT_FILENAME, derive_filename, sanitize_filename};
