//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Collect every image referenced by a list of web pages and archive them
/// per page.
///
/// Reads page URLs (one per line) from the input file, downloads the images
/// each page references, zips them into `<data-dir>/archives/<hash>.zip`, and
/// writes a JSON manifest mapping pages to archives.
#[derive(Parser, Debug)]
#[command(name = "bulk-image-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Settings file (JSON). Defaults to config/settings.json if present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Input file with page URLs, one per line [default: <data-dir>/input_urls.txt]
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Directory for archives and the results manifest
    #[arg(long, value_name = "DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Transient directory holding per-page downloads
    #[arg(long, value_name = "DIR", default_value = "downloads")]
    pub workspace: PathBuf,

    /// Maximum concurrent downloads per page (1-100), overrides settings
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Keep the per-page workspace after the run
    #[arg(long)]
    pub keep_workspace: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Log filter implied by the flags, if any flag was given.
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
