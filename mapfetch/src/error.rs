//! Error types for the download manager.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::download::ByteRange;

/// Result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

/// Errors that can occur while scheduling or performing a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Invalid file or chunk size handed to the chunk table.
    #[error("invalid chunking: file_size={file_size}, chunk_size={chunk_size}")]
    InvalidChunking { file_size: i64, chunk_size: i64 },

    /// No mirror URLs were configured.
    #[error("no mirrors configured")]
    NoMirrors,

    /// A completion report referenced a range the scheduler never handed out,
    /// or one that is not currently in flight.
    ///
    /// This is a caller contract violation, not a transient condition.
    #[error("no chunk in flight for range {range}")]
    ChunkNotInFlight { range: ByteRange },

    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    /// A ranged HTTP request failed or returned the wrong data.
    #[error("range request to {url} failed: {reason}")]
    FetchFailed { url: String, reason: String },

    /// Checksum verification of the assembled file failed.
    #[error("checksum mismatch for {filename}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// The download cannot make further progress.
    #[error("download failed: {0}")]
    Failed(String),
}
