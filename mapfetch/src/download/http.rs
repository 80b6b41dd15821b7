//! Blocking HTTP range fetcher.
//!
//! Performs the actual byte transfers the scheduler hands out: one ranged
//! GET per chunk, against whichever mirror the chunk was assigned to.

use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::download::chunk::ByteRange;
use crate::error::{DownloadError, DownloadResult};

/// Buffer size for reading response bodies (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// HTTP client for fetching byte ranges from mirrors.
#[derive(Debug, Clone)]
pub struct RangeFetcher {
    client: Client,
}

impl Default for RangeFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

impl RangeFetcher {
    /// Create a fetcher with the given per-request timeout.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    /// Get the size of the file at `url` via HEAD request.
    ///
    /// Used when the caller does not already know the target size.
    pub fn content_length(&self, url: &str) -> DownloadResult<i64> {
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| DownloadError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::FetchFailed {
                url: url.to_string(),
                reason: format!("HEAD request failed with status {}", response.status()),
            });
        }

        response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|&len| len > 0)
            .ok_or_else(|| DownloadError::FetchFailed {
                url: url.to_string(),
                reason: "missing or invalid content-length".to_string(),
            })
    }

    /// Fetch one byte range from `url`.
    ///
    /// Sends `Range: bytes=start-(end-1)` and requires the server to answer
    /// `206 Partial Content` with a body of exactly `range.len()` bytes; a
    /// `200 OK` means the server ignored the range and would hand back the
    /// whole file, which is treated as a failure.
    pub fn fetch_range(&self, url: &str, range: ByteRange) -> DownloadResult<Vec<u8>> {
        let fetch_err = |reason: String| DownloadError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .header("Range", format!("bytes={}-{}", range.start, range.end - 1))
            .send()
            .map_err(|e| fetch_err(e.to_string()))?;

        if response.status().as_u16() != 206 {
            return Err(fetch_err(format!(
                "expected 206 Partial Content, got {}",
                response.status()
            )));
        }

        let expected = range.len() as usize;
        let mut body = Vec::with_capacity(expected);
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| fetch_err(format!("read error: {}", e)))?;
            if bytes_read == 0 {
                break;
            }
            body.extend_from_slice(&buffer[..bytes_read]);
            if body.len() > expected {
                return Err(fetch_err(format!(
                    "server sent more than the {} requested bytes",
                    expected
                )));
            }
        }

        if body.len() != expected {
            return Err(fetch_err(format!(
                "short body: got {} of {} bytes for range {}",
                body.len(),
                expected,
                range
            )));
        }

        Ok(body)
    }
}
