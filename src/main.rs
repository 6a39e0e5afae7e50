//! CLI entry point for the bulk image downloader.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bulk_image_downloader::settings::DEFAULT_SETTINGS_PATH;
use bulk_image_downloader::{RunPaths, Settings, run_pipeline};
use clap::Parser;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let settings = load_settings(&args)?;

    // Priority: RUST_LOG env var > quiet flag > verbose flag > settings > info
    let default_level = args
        .log_level_override()
        .map_or_else(|| settings.log_level.to_lowercase(), str::to_string);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    debug!(?settings, "settings resolved");
    info!("Bulk image downloader starting");

    let mut paths = RunPaths::new(&args.data_dir, &args.workspace);
    if let Some(input) = &args.input {
        paths = paths.with_input(input.clone());
    }

    let summary = run_pipeline(&paths, &settings)
        .await
        .with_context(|| format!("run failed for input {}", paths.input.display()))?;

    if let Some(manifest) = &summary.manifest {
        info!(
            archived = summary.archived,
            skipped = summary.skipped(),
            manifest = %manifest.display(),
            "Done"
        );
    }

    Ok(())
}

/// Settings file, then environment, then CLI flags.
fn load_settings(args: &Args) -> Result<Settings> {
    let settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::load_or_default(&PathBuf::from(DEFAULT_SETTINGS_PATH))?,
    };
    let mut settings = settings
        .apply_process_env()
        .context("invalid environment override")?;

    if let Some(concurrency) = args.concurrency {
        settings.concurrency = usize::from(concurrency);
    }
    if args.keep_workspace {
        settings.keep_workspace = true;
    }

    settings
        .validate()
        .with_context(|| format!("invalid settings ({})", config_label(args.config.as_deref())))?;
    Ok(settings)
}

fn config_label(path: Option<&Path>) -> String {
    path.map_or_else(
        || format!("{DEFAULT_SETTINGS_PATH} or defaults"),
        |p| p.display().to_string(),
    )
}
