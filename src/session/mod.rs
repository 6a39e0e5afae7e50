//! Shared HTTP session used by both the collector and the downloader.
//!
//! A [`Session`] is built once per run from an immutable [`SessionConfig`]
//! and cloned cheaply into every concurrent worker. It carries:
//!
//! - Proxy routing (when `use_proxies` is set; direct connection otherwise)
//! - Default headers (User-Agent, Accept, Accept-Language, Connection)
//! - A bounded connection pool
//! - Automatic retry with exponential backoff for GET/HEAD on
//!   429/500/502/503/504 responses
//!
//! # Example
//!
//! ```no_run
//! use bulk_image_downloader::session::{SessionConfig, build_session};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = build_session(SessionConfig::default())?;
//! let response = session.get("https://example.com/", Duration::from_secs(20)).await?;
//! println!("status: {}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod retry;

pub use client::{Session, build_session};
pub use config::{DEFAULT_POOL_SIZE, DEFAULT_TIMEOUT_SECS, ProxySettings, SessionConfig};
pub use error::SessionError;
pub use retry::{DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy, parse_retry_after};
