//! MapFetch CLI - download one large file from a set of mirror servers.
//!
//! Thin driver around the `mapfetch` library: parses arguments, sets up
//! logging, wires a progress bar to the library's progress callback, and
//! runs the download.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use mapfetch::download::{MirrorDownloader, ProgressCallback, RangeFetcher};
use mapfetch::{DownloadConfig, DownloadError};

/// Chunked, resumable downloads of large map packages from mirror servers.
#[derive(Parser, Debug)]
#[command(name = "mapfetch", version, about)]
struct Cli {
    /// Mirror URLs for the same file, in preference order.
    #[arg(required = true)]
    mirrors: Vec<String>,

    /// Destination file.
    #[arg(short, long)]
    output: PathBuf,

    /// Target file size in bytes; discovered via a HEAD request to the
    /// first mirror when omitted.
    #[arg(long)]
    size: Option<i64>,

    /// Chunk size in bytes.
    #[arg(long, default_value_t = mapfetch::config::DEFAULT_CHUNK_SIZE)]
    chunk_size: i64,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// How many times a chunk may fail before giving up.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Expected SHA-256 of the complete file (lowercase hex).
    #[arg(long)]
    sha256: Option<String>,

    /// Start from scratch, ignoring and not writing a resume file.
    #[arg(long)]
    no_resume: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(bytes) => {
            eprintln!("downloaded {} bytes", bytes);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<i64, DownloadError> {
    let timeout = Duration::from_secs(cli.timeout);

    let file_size = match cli.size {
        Some(size) => size,
        None => {
            let size = RangeFetcher::new(timeout).content_length(&cli.mirrors[0])?;
            tracing::info!(url = %cli.mirrors[0], size, "discovered file size");
            size
        }
    };

    let mut config = DownloadConfig::new()
        .with_chunk_size(cli.chunk_size)
        .with_timeout(timeout)
        .with_max_chunk_retries(cli.retries)
        .with_save_resume(!cli.no_resume);
    if let Some(sha256) = cli.sha256 {
        config = config.with_expected_sha256(sha256);
    }

    let bar = ProgressBar::new(file_size as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
        )
        .expect("valid progress template"),
    );

    let bar_updater = bar.clone();
    let on_progress: ProgressCallback = Box::new(move |progress| {
        bar_updater.set_position(progress.bytes_complete as u64);
    });

    let downloader = MirrorDownloader::with_config(config);
    let bytes = downloader.download(cli.mirrors, file_size, &cli.output, Some(on_progress))?;

    bar.finish_and_clear();
    Ok(bytes)
}
