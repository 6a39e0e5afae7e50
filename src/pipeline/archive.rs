//! Zip archiving of a page workspace.

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::PipelineError;

/// Zips every file under `src_dir` into `zip_path` (deflate), with entry
/// names relative to `src_dir`. Returns the number of files archived.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Archive`] on failure.
pub async fn zip_directory(src_dir: &Path, zip_path: &Path) -> Result<usize, PipelineError> {
    let src_dir = src_dir.to_path_buf();
    let zip_path = zip_path.to_path_buf();
    let task_path = zip_path.clone();
    tokio::task::spawn_blocking(move || zip_directory_blocking(&src_dir, &zip_path))
        .await
        .map_err(|e| PipelineError::Io {
            path: task_path,
            source: std::io::Error::other(e),
        })?
}

fn zip_directory_blocking(src_dir: &Path, zip_path: &Path) -> Result<usize, PipelineError> {
    let files = collect_files(src_dir)?;
    zip_files(src_dir, &files, zip_path)
}

/// Writes `files` into a new archive at `zip_path`, removing it on error.
fn zip_files(root: &Path, files: &[PathBuf], zip_path: &Path) -> Result<usize, PipelineError> {
    let file = File::create(zip_path).map_err(|e| PipelineError::io(zip_path, e))?;
    let result = write_entries(file, root, files, zip_path);
    if result.is_err() {
        debug!(archive = %zip_path.display(), "removing incomplete archive");
        if let Err(e) = std::fs::remove_file(zip_path) {
            debug!(archive = %zip_path.display(), error = %e, "could not remove incomplete archive");
        }
    }
    result
}

fn write_entries(
    file: File,
    root: &Path,
    files: &[PathBuf],
    zip_path: &Path,
) -> Result<usize, PipelineError> {
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in files {
        let name = entry_name(root, path);
        zip.start_file(name, options)
            .map_err(|e| PipelineError::archive(zip_path, e))?;
        let mut reader = BufReader::new(File::open(path).map_err(|e| PipelineError::io(path, e))?);
        std::io::copy(&mut reader, &mut zip).map_err(|e| PipelineError::io(zip_path, e))?;
    }

    let mut inner = zip
        .finish()
        .map_err(|e| PipelineError::archive(zip_path, e))?;
    inner.flush().map_err(|e| PipelineError::io(zip_path, e))?;

    debug!(archive = %zip_path.display(), files = files.len(), "archive written");
    Ok(files.len())
}

/// Lists regular files under `root` recursively, sorted by path.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| PipelineError::io(&dir, e))?;
        for entry in entries {
            let path = entry.map_err(|e| PipelineError::io(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn entry_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
