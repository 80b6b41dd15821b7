//! Configuration for the download manager.

use std::time::Duration;

/// Default chunk size: 4 MiB.
pub const DEFAULT_CHUNK_SIZE: i64 = 4 * 1024 * 1024;

/// Configuration for a download session.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Size of each byte-range request.
    ///
    /// The last chunk of a file may be smaller.
    pub chunk_size: i64,

    /// HTTP request timeout for a single range fetch.
    pub timeout: Duration,

    /// How many times a single chunk may fail before the whole download is
    /// declared failed.
    pub max_chunk_retries: u32,

    /// Whether to persist the chunk table after each completed batch so an
    /// interrupted download can resume.
    pub save_resume: bool,

    /// Expected SHA-256 of the assembled file (lowercase hex), if known.
    pub expected_sha256: Option<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(60),
            max_chunk_retries: 3,
            save_resume: true,
            expected_sha256: None,
        }
    }
}

impl DownloadConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chunk size in bytes.
    pub fn with_chunk_size(mut self, chunk_size: i64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the per-request HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-chunk retry budget.
    pub fn with_max_chunk_retries(mut self, retries: u32) -> Self {
        self.max_chunk_retries = retries;
        self
    }

    /// Enable or disable resume-file persistence.
    pub fn with_save_resume(mut self, save: bool) -> Self {
        self.save_resume = save;
        self
    }

    /// Set the expected SHA-256 checksum of the complete file.
    pub fn with_expected_sha256(mut self, checksum: impl Into<String>) -> Self {
        self.expected_sha256 = Some(checksum.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_chunk_retries, 3);
        assert!(config.save_resume);
        assert!(config.expected_sha256.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = DownloadConfig::new()
            .with_chunk_size(512 * 1024)
            .with_timeout(Duration::from_secs(30))
            .with_max_chunk_retries(5)
            .with_save_resume(false)
            .with_expected_sha256("abc123");

        assert_eq!(config.chunk_size, 512 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_chunk_retries, 5);
        assert!(!config.save_resume);
        assert_eq!(config.expected_sha256.as_deref(), Some("abc123"));
    }
}
