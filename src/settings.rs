//! Run settings: JSON file, environment overrides, validation.
//!
//! Resolution order for every key is: environment variable, then the
//! settings file, then the built-in default. CLI flags are applied on top by
//! the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::download::DEFAULT_CONCURRENCY;
use crate::session::{DEFAULT_TIMEOUT_SECS, ProxySettings, SessionConfig};
use crate::user_agent::default_user_agent;

/// Default settings file location, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";

/// Default minimum image size in bytes (only enforced on request).
pub const DEFAULT_MIN_IMAGE_BYTES: u64 = 1024;

/// Allowed concurrency range.
pub const CONCURRENCY_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

/// Allowed timeout range in seconds.
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=3600;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An explicitly requested settings file does not exist.
    #[error("settings file not found: {path}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The settings file exists but could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Read {
        /// The settings path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// The settings path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An environment override holds a value of the wrong type.
    #[error("invalid value '{value}' for environment variable {name}")]
    InvalidEnv {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A setting is out of its allowed range.
    #[error("invalid setting {key}: {reason}")]
    Invalid {
        /// The offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of concurrent download workers per page.
    pub concurrency: usize,
    /// Network timeout in seconds.
    pub timeout: u64,
    /// Minimum acceptable image size in bytes.
    pub min_image_bytes: u64,
    /// Whether `min_image_bytes` rejects smaller payloads.
    pub enforce_min_image_bytes: bool,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Log level name (`ERROR`, `WARN`, `INFO`, `DEBUG`, `TRACE`).
    pub log_level: String,
    /// Keep per-page workspaces after the run.
    pub keep_workspace: bool,
    /// Proxy routing.
    pub proxies: ProxySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT_SECS,
            min_image_bytes: DEFAULT_MIN_IMAGE_BYTES,
            enforce_min_image_bytes: false,
            user_agent: default_user_agent(),
            log_level: "INFO".to_string(),
            keep_workspace: false,
            proxies: ProxySettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotFound`] if the file does not exist, or a
    /// read/parse error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Err(SettingsError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "settings file loaded");
        Ok(settings)
    }

    /// Loads settings from `path` if it exists, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// Returns a read/parse error if the file exists but is unusable.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no settings file, using defaults");
            Ok(Self::default())
        }
    }

    /// Applies `BID_*` and proxy environment overrides from the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidEnv`] for non-numeric numeric values.
    pub fn apply_process_env(self) -> Result<Self, SettingsError> {
        self.apply_env_overrides(|name| std::env::var(name).ok())
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Any HTTP or HTTPS proxy variable switches proxy routing on.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidEnv`] for non-numeric numeric values.
    pub fn apply_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SettingsError> {
        if let Some(value) = lookup("BID_CONCURRENCY") {
            self.concurrency = parse_env("BID_CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("BID_TIMEOUT") {
            self.timeout = parse_env("BID_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("BID_MIN_IMAGE_BYTES") {
            self.min_image_bytes = parse_env("BID_MIN_IMAGE_BYTES", &value)?;
        }
        if let Some(value) = lookup("BID_USER_AGENT") {
            self.user_agent = value;
        }

        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let http = non_empty("HTTP_PROXY").or_else(|| non_empty("http_proxy"));
        let https = non_empty("HTTPS_PROXY").or_else(|| non_empty("https_proxy"));
        if http.is_some() || https.is_some() {
            self.proxies.use_proxies = true;
            if http.is_some() {
                self.proxies.http = http;
            }
            if https.is_some() {
                self.proxies.https = https;
            }
        }
        Ok(self)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !CONCURRENCY_RANGE.contains(&self.concurrency) {
            return Err(SettingsError::Invalid {
                key: "concurrency",
                reason: format!(
                    "{} is outside {}..={}",
                    self.concurrency,
                    CONCURRENCY_RANGE.start(),
                    CONCURRENCY_RANGE.end()
                ),
            });
        }
        if !TIMEOUT_RANGE_SECS.contains(&self.timeout) {
            return Err(SettingsError::Invalid {
                key: "timeout",
                reason: format!(
                    "{}s is outside {}..={} seconds",
                    self.timeout,
                    TIMEOUT_RANGE_SECS.start(),
                    TIMEOUT_RANGE_SECS.end()
                ),
            });
        }
        if self.user_agent.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "user_agent",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Minimum payload size to enforce, if enforcement is switched on.
    #[must_use]
    pub fn enforced_min_image_bytes(&self) -> Option<u64> {
        self.enforce_min_image_bytes.then_some(self.min_image_bytes)
    }

    /// Builds the immutable session configuration for this run.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_user_agent(self.user_agent.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_proxies(self.proxies.clone())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidEnv {
            name,
            value: value.to_string(),
        })
}
