//! Progress reporting for a download session.

/// Callback invoked on the driving thread after each resolved chunk.
pub type ProgressCallback = Box<dyn Fn(&DownloadProgress) + Send + Sync>;

/// Point-in-time snapshot of download progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes durably downloaded so far.
    pub bytes_complete: i64,
    /// Total size of the target file.
    pub total_bytes: i64,
    /// Chunks durably downloaded so far.
    pub chunks_complete: usize,
    /// Total number of chunks.
    pub total_chunks: usize,
}

impl DownloadProgress {
    /// Progress as a percentage (0.0 to 100.0).
    pub fn percent(&self) -> f64 {
        if self.total_bytes <= 0 {
            100.0
        } else {
            (self.bytes_complete as f64 / self.total_bytes as f64) * 100.0
        }
    }

    /// Progress as a ratio (0.0 to 1.0).
    pub fn ratio(&self) -> f64 {
        self.percent() / 100.0
    }

    /// Whether every chunk is complete.
    pub fn is_complete(&self) -> bool {
        self.chunks_complete == self.total_chunks
    }
}
