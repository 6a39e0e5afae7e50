//! Run orchestration.
//!
//! For each input page: collect image URLs, download them into a per-page
//! workspace, zip the workspace into `archives/<hash>.zip`, and record the
//! archive in the run manifest. Pages are processed one after another; a
//! failing page is logged and skipped, never aborting the run.

mod archive;
mod input;
mod manifest;
mod task;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use archive::zip_directory;
pub use input::{parse_input_urls, read_input_urls};
pub use manifest::{RunManifestEntry, write_manifest};
pub use task::{PageTask, url_hash};

use crate::collector::ImageCollector;
use crate::download::{DownloadError, Downloader};
use crate::session::{SessionError, build_session};
use crate::settings::Settings;

/// Default manifest file name inside the data directory.
pub const MANIFEST_FILE_NAME: &str = "results.json";

/// Default input file name inside the data directory.
pub const INPUT_FILE_NAME: &str = "input_urls.txt";

/// Errors raised by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input URL list could not be read.
    #[error("failed to read input file {path}: {source}")]
    Input {
        /// The input path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A filesystem operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a zip archive failed.
    #[error("failed to write archive {path}: {source}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// The underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The manifest could not be serialized.
    #[error("failed to serialize manifest {path}: {source}")]
    Manifest {
        /// The manifest path.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP session could not be built.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A page's download directory could not be prepared.
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl PipelineError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }
}

/// Filesystem layout for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// Input URL list, one page per line.
    pub input: PathBuf,
    /// Directory receiving `<hash>.zip` archives.
    pub archives_dir: PathBuf,
    /// Transient root holding one workspace per page.
    pub workspace_root: PathBuf,
    /// Manifest JSON output.
    pub manifest: PathBuf,
}

impl RunPaths {
    /// Standard layout under `data_dir`: `input_urls.txt`, `archives/`,
    /// `results.json`, with workspaces under `workspace_root`.
    #[must_use]
    pub fn new(data_dir: &Path, workspace_root: &Path) -> Self {
        Self {
            input: data_dir.join(INPUT_FILE_NAME),
            archives_dir: data_dir.join("archives"),
            workspace_root: workspace_root.to_path_buf(),
            manifest: data_dir.join(MANIFEST_FILE_NAME),
        }
    }

    /// Replaces the input file path.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        self
    }
}

/// Outcome of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Pages read from the input.
    pub pages: usize,
    /// Pages that produced an archive.
    pub archived: usize,
    /// Images saved across all pages.
    pub images: usize,
    /// Manifest entries, in input order.
    pub entries: Vec<RunManifestEntry>,
    /// Where the manifest was written, if any page was archived.
    pub manifest: Option<PathBuf>,
}

impl RunSummary {
    /// Pages that produced no archive.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.pages - self.archived
    }
}

/// Runs the whole pipeline for the pages listed in `paths.input`.
///
/// # Errors
///
/// Returns an error only for run-level failures: an invalid session
/// configuration (checked before any I/O), unreadable input, output
/// directories that cannot be created, or a manifest that cannot be written. Per-page failures are logged.
#[instrument(skip_all, fields(input = %paths.input.display()))]
pub async fn run_pipeline(paths: &RunPaths, settings: &Settings) -> Result<RunSummary, PipelineError> {
    let session = build_session(settings.session_config())?;
    let urls = read_input_urls(&paths.input).await?;
    let mut summary = RunSummary {
        pages: urls.len(),
        ..RunSummary::default()
    };
    if urls.is_empty() {
        warn!(
            input = %paths.input.display(),
            "no URLs found in input file (one page URL per line)"
        );
        return Ok(summary);
    }

    for dir in [&paths.archives_dir, &paths.workspace_root] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| PipelineError::io(dir, e))?;
    }

    let collector = ImageCollector::new(session.clone());
    let downloader = Downloader::new(session, settings.concurrency)
        .with_min_image_bytes(settings.enforced_min_image_bytes());

    info!(pages = urls.len(), "starting bulk image download");
    for url in urls {
        let task = PageTask::new(url);
        match process_page(&task, paths, &collector, &downloader).await {
            Ok(Some((entry, images))) => {
                summary.archived += 1;
                summary.images += images;
                summary.entries.push(entry);
            }
            Ok(None) => {}
            Err(e) => warn!(page = %task.url(), error = %e, "failed processing page"),
        }
    }

    if summary.entries.is_empty() {
        warn!("no results produced, check logs for details");
    } else {
        write_manifest(&paths.manifest, &summary.entries).await?;
        info!(manifest = %paths.manifest.display(), "wrote results");
        summary.manifest = Some(paths.manifest.clone());
    }

    if settings.keep_workspace {
        debug!(workspace = %paths.workspace_root.display(), "keeping workspace");
    } else if let Err(e) = tokio::fs::remove_dir_all(&paths.workspace_root).await {
        debug!(workspace = %paths.workspace_root.display(), error = %e, "workspace cleanup skipped");
    }

    info!(
        pages = summary.pages,
        archived = summary.archived,
        skipped = summary.skipped(),
        images = summary.images,
        "run complete"
    );
    Ok(summary)
}

/// Processes one page. `Ok(None)` means the page yielded nothing to archive.
async fn process_page(
    task: &PageTask,
    paths: &RunPaths,
    collector: &ImageCollector,
    downloader: &Downloader,
) -> Result<Option<(RunManifestEntry, usize)>, PipelineError> {
    let work_dir = task.workspace_dir(&paths.workspace_root);
    tokio::fs::create_dir_all(&work_dir)
        .await
        .map_err(|e| PipelineError::io(&work_dir, e))?;

    info!(page = %task.url(), "collecting image URLs");
    let image_urls = collector.collect(task.url()).await;
    if image_urls.is_empty() {
        warn!(page = %task.url(), "no images found");
        return Ok(None);
    }

    info!(page = %task.url(), images = image_urls.len(), "downloading images");
    let saved = downloader.download_many(&image_urls, &work_dir).await?;
    if saved.is_empty() {
        warn!(page = %task.url(), "no images successfully downloaded");
        return Ok(None);
    }

    let zip_path = task.archive_path(&paths.archives_dir);
    zip_directory(&work_dir, &zip_path).await?;
    let download = std::path::absolute(&zip_path)
        .map_err(|e| PipelineError::io(&zip_path, e))?
        .display()
        .to_string();

    info!(page = %task.url(), files = saved.len(), archive = %download, "page archived");
    Ok(Some((
        RunManifestEntry {
            url: task.url().to_string(),
            url_hash: task.hash().to_string(),
            download,
        },
        saved.len(),
    )))
}
