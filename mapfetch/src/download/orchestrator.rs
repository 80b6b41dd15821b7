//! End-to-end download orchestration.
//!
//! [`MirrorDownloader`] is the driver layered on top of the scheduler: it
//! pulls assignments, runs the transfers on worker threads (one per busy
//! mirror), writes finished ranges into the destination file, reports
//! outcomes back, and persists the chunk table after each batch so an
//! interrupted run can resume.
//!
//! The retry policy the scheduler deliberately does not have lives here:
//! each chunk gets a bounded number of attempts before the whole session is
//! declared failed.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::DownloadConfig;
use crate::download::checksum::verify_file;
use crate::download::chunk::ChunkStatus;
use crate::download::http::RangeFetcher;
use crate::download::progress::{DownloadProgress, ProgressCallback};
use crate::download::scheduler::{ChunkScheduler, NextChunk};
use crate::error::{DownloadError, DownloadResult};

/// Drives a [`ChunkScheduler`] to completion against real mirrors.
#[derive(Debug, Default)]
pub struct MirrorDownloader {
    config: DownloadConfig,
}

impl MirrorDownloader {
    /// Create a downloader with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a downloader with the given configuration.
    pub fn with_config(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Where the resume file for `dest` lives: `<dest>.resume` alongside it.
    pub fn resume_path(dest: &Path) -> PathBuf {
        let mut name = dest.file_name().unwrap_or_default().to_os_string();
        name.push(".resume");
        dest.with_file_name(name)
    }

    /// Download `file_size` bytes into `dest` from the given mirrors.
    ///
    /// Resumes from a previous run's chunk table when one is valid, runs
    /// until every chunk is complete, verifies the configured checksum, and
    /// removes the resume file. Returns the total bytes now complete
    /// (always `file_size` on success).
    pub fn download(
        &self,
        mirrors: Vec<String>,
        file_size: i64,
        dest: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> DownloadResult<i64> {
        let fetcher = RangeFetcher::new(self.config.timeout);
        let mut scheduler = ChunkScheduler::new(mirrors, file_size, self.config.chunk_size)?;

        let resume_path = Self::resume_path(dest);
        let already = if self.config.save_resume {
            scheduler.load_or_init(&resume_path, file_size, self.config.chunk_size)?
        } else {
            0
        };

        tracing::info!(
            dest = %dest.display(),
            file_size,
            chunk_size = self.config.chunk_size,
            mirrors = scheduler.mirror_count(),
            bytes_resumed = already,
            "starting download"
        );

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| DownloadError::WriteFailed {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(dest)
            .map_err(|e| DownloadError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;
        file.set_len(file_size as u64)
            .map_err(|e| DownloadError::WriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;

        let mut attempts: HashMap<i64, u32> = HashMap::new();

        loop {
            // Pull assignments until the pool or the table runs dry. At the
            // top of each iteration nothing is in flight, so the scheduler
            // either produces work, reports completion, or reports failure.
            let mut batch = Vec::new();
            let finished = loop {
                match scheduler.next_chunk() {
                    NextChunk::Assigned(assignment) => batch.push(assignment),
                    NextChunk::NoIdleMirror | NextChunk::AllInFlight => break false,
                    NextChunk::Complete => break true,
                    NextChunk::Failed => {
                        return Err(DownloadError::Failed(
                            "scheduler is in terminal failure state".to_string(),
                        ))
                    }
                }
            };
            if finished {
                break;
            }
            debug_assert!(!batch.is_empty());

            // One worker thread per assignment; batch size is bounded by the
            // mirror count.
            let handles: Vec<_> = batch
                .into_iter()
                .map(|assignment| {
                    let fetcher = fetcher.clone();
                    thread::spawn(move || {
                        let result = fetcher.fetch_range(&assignment.url, assignment.range);
                        (assignment, result)
                    })
                })
                .collect();

            // Resolve outcomes on this thread, one at a time.
            for handle in handles {
                let (assignment, result) = handle
                    .join()
                    .map_err(|_| DownloadError::Failed("download worker panicked".to_string()))?;

                match result {
                    Ok(bytes) => {
                        file.seek(SeekFrom::Start(assignment.range.start as u64))
                            .and_then(|_| file.write_all(&bytes))
                            .map_err(|e| DownloadError::WriteFailed {
                                path: dest.to_path_buf(),
                                source: e,
                            })?;
                        scheduler.chunk_finished(true, assignment.range)?;
                    }
                    Err(err) => {
                        let url = scheduler.chunk_finished(false, assignment.range)?;
                        let tries = attempts.entry(assignment.range.start).or_insert(0);
                        *tries += 1;
                        tracing::warn!(
                            %url,
                            range = %assignment.range,
                            attempt = *tries,
                            error = %err,
                            "chunk fetch failed"
                        );
                        if *tries > self.config.max_chunk_retries {
                            scheduler.mark_failed();
                        }
                    }
                }
            }

            // Success milestone: persist what we have before the next batch.
            if self.config.save_resume {
                scheduler.save(&resume_path)?;
            }
            if let Some(cb) = &on_progress {
                cb(&progress_of(&scheduler, file_size));
            }
            if scheduler.has_failed() {
                return Err(DownloadError::Failed(format!(
                    "a chunk exceeded {} retries",
                    self.config.max_chunk_retries
                )));
            }
        }

        file.flush().map_err(|e| DownloadError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        drop(file);

        if let Some(expected) = &self.config.expected_sha256 {
            verify_file(dest, expected)?;
        }
        if self.config.save_resume {
            // Nothing left to resume.
            fs::remove_file(&resume_path).ok();
        }

        let total = scheduler.bytes_complete();
        tracing::info!(dest = %dest.display(), bytes = total, "download complete");
        Ok(total)
    }
}

fn progress_of(scheduler: &ChunkScheduler, file_size: i64) -> DownloadProgress {
    DownloadProgress {
        bytes_complete: scheduler.bytes_complete(),
        total_bytes: file_size,
        chunks_complete: scheduler.table().count_with_status(ChunkStatus::Complete),
        total_chunks: scheduler.table().len(),
    }
}
