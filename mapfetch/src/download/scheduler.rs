//! The chunk-to-mirror assignment state machine.
//!
//! [`ChunkScheduler`] owns one [`ChunkTable`] and one [`ServerPool`] for the
//! duration of a download session and decides which byte range should be
//! fetched next from which mirror. It performs no network I/O itself: an
//! external driver pulls assignments out of [`ChunkScheduler::next_chunk`],
//! runs each transfer out of band, and reports the outcome back through
//! [`ChunkScheduler::chunk_finished`] exactly once per assignment.
//!
//! The scheduler is single-threaded and non-reentrant by design. All state
//! transitions happen synchronously inside its methods and none of them
//! block, so concurrency comes entirely from the driver running multiple
//! transfers at once (bounded by [`ChunkScheduler::mirror_count`]) and
//! serializing its calls back in.
//!
//! Per-chunk transitions are `Free -> Downloading -> {Complete | Free}`.
//! `Aux` chunks are never assigned and never transition. The scheduler keeps
//! no failure-counting memory: a failed chunk simply becomes `Free` again,
//! and any backoff or mirror-banning policy belongs to the driver, which can
//! declare the session dead via [`ChunkScheduler::mark_failed`].

use std::path::Path;

use crate::download::chunk::{ByteRange, ChunkStatus};
use crate::download::pool::ServerPool;
use crate::download::resume;
use crate::download::table::ChunkTable;
use crate::error::{DownloadError, DownloadResult};

/// A unit of work handed to the driver: fetch `range` from `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Mirror to fetch from.
    pub url: String,
    /// Byte range to request.
    pub range: ByteRange,
}

/// Outcome of asking the scheduler for more work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextChunk {
    /// Work was produced; call again to look for more.
    Assigned(Assignment),

    /// Every mirror is busy. Backpressure, not an error: report an in-flight
    /// chunk before asking again.
    NoIdleMirror,

    /// A mirror is idle but every remaining chunk is already in flight.
    /// Waiting will produce more work once one of them resolves.
    AllInFlight,

    /// Every schedulable chunk is complete. Terminal success.
    Complete,

    /// The session was declared failed. Terminal; no further work is
    /// handed out.
    Failed,
}

/// Scheduler assigning file chunks to mirror servers.
#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    table: ChunkTable,
    pool: ServerPool,
    failed: bool,
}

impl ChunkScheduler {
    /// Create a scheduler for one download session.
    ///
    /// Builds a fresh all-`Free` chunk table for `file_size` partitioned
    /// into `chunk_size` pieces, served by the given ordered, non-empty
    /// mirror list.
    pub fn new(mirrors: Vec<String>, file_size: i64, chunk_size: i64) -> DownloadResult<Self> {
        Ok(Self {
            table: ChunkTable::init(file_size, chunk_size)?,
            pool: ServerPool::new(mirrors)?,
            failed: false,
        })
    }

    /// Discard the current table and start over with a fresh one.
    ///
    /// All mirror bindings are dropped and a prior terminal state is
    /// cleared.
    pub fn init_chunks(&mut self, file_size: i64, chunk_size: i64) -> DownloadResult<()> {
        self.table = ChunkTable::init(file_size, chunk_size)?;
        self.pool.clear_bindings();
        self.failed = false;
        Ok(())
    }

    /// Adopt a previously saved chunk table, or start fresh.
    ///
    /// If `path` holds a valid table for this `file_size`/`chunk_size`, the
    /// session resumes from it and the number of bytes already complete is
    /// returned. Any validation failure (missing file, wrong size, corrupt
    /// records) silently degrades to [`ChunkScheduler::init_chunks`] and 0
    /// bytes.
    pub fn load_or_init(
        &mut self,
        path: &Path,
        file_size: i64,
        chunk_size: i64,
    ) -> DownloadResult<i64> {
        match resume::load_table(path, file_size, chunk_size) {
            Some(table) => {
                let bytes = table.bytes_complete();
                self.table = table;
                self.pool.clear_bindings();
                self.failed = false;
                Ok(bytes)
            }
            None => {
                self.init_chunks(file_size, chunk_size)?;
                Ok(0)
            }
        }
    }

    /// Persist the current chunk table to `path`.
    pub fn save(&self, path: &Path) -> DownloadResult<()> {
        resume::save_table(&self.table, path)
    }

    /// Ask for the next unit of work.
    ///
    /// See [`NextChunk`] for the possible outcomes. `Assigned` marks the
    /// chunk `Downloading` and binds it to the chosen mirror; the caller
    /// must eventually resolve it via [`ChunkScheduler::chunk_finished`].
    pub fn next_chunk(&mut self) -> NextChunk {
        if self.failed {
            return NextChunk::Failed;
        }
        if self.table.all_complete() {
            return NextChunk::Complete;
        }

        let Some(mirror_index) = self.pool.first_idle() else {
            return NextChunk::NoIdleMirror;
        };

        let Some(chunk_index) = self.table.first_with_status(ChunkStatus::Free) else {
            // Nothing Free but not everything Complete: the remainder is in
            // flight on other mirrors.
            return NextChunk::AllInFlight;
        };

        self.table.set_status(chunk_index, ChunkStatus::Downloading);
        self.pool.bind(mirror_index, chunk_index);

        let range = self.table.range_of(chunk_index);
        let url = self.pool.mirrors()[mirror_index].url.clone();
        tracing::debug!(%url, %range, "assigned chunk");

        NextChunk::Assigned(Assignment { url, range })
    }

    /// Resolve a previously handed-out assignment.
    ///
    /// On success the chunk becomes `Complete`; on failure it returns to
    /// `Free` and may be re-assigned, possibly to a different mirror.
    /// Either way the mirror that was downloading it goes back to idle and
    /// its URL is returned, so the caller can log which mirror failed or
    /// immediately reuse it.
    ///
    /// # Errors
    ///
    /// [`DownloadError::ChunkNotInFlight`] if no chunk starts exactly at
    /// `range.start` or the chunk is not currently `Downloading` (e.g. a
    /// duplicate report). This indicates a driver bug, not a transfer
    /// problem; `Complete` chunks never transition back.
    pub fn chunk_finished(&mut self, success: bool, range: ByteRange) -> DownloadResult<String> {
        let chunk_index = self
            .table
            .find(range.start)
            .filter(|&i| self.table.status_of(i) == ChunkStatus::Downloading)
            .ok_or(DownloadError::ChunkNotInFlight { range })?;

        let url = self
            .pool
            .release(chunk_index)
            .ok_or(DownloadError::ChunkNotInFlight { range })?;

        if success {
            self.table.set_status(chunk_index, ChunkStatus::Complete);
            tracing::debug!(%url, %range, "chunk complete");
        } else {
            self.table.set_status(chunk_index, ChunkStatus::Free);
            tracing::warn!(%url, %range, "chunk failed, re-queued");
        }

        Ok(url)
    }

    /// Declare the session dead.
    ///
    /// After this, [`ChunkScheduler::next_chunk`] returns
    /// [`NextChunk::Failed`] forever. The scheduler never decides this on
    /// its own; the driver calls it when its retry policy gives up.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Whether the session has been declared failed.
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Total number of configured mirrors.
    ///
    /// The upper bound on concurrent assignments.
    pub fn mirror_count(&self) -> usize {
        self.pool.mirror_count()
    }

    /// Number of chunks currently in flight.
    pub fn in_flight(&self) -> usize {
        self.table.count_with_status(ChunkStatus::Downloading)
    }

    /// Bytes covered by `Complete` chunks.
    pub fn bytes_complete(&self) -> i64 {
        self.table.bytes_complete()
    }

    /// Whether every schedulable chunk is complete.
    pub fn is_complete(&self) -> bool {
        self.table.all_complete()
    }

    /// The owned chunk table.
    pub fn table(&self) -> &ChunkTable {
        &self.table
    }

    #[cfg(test)]
    pub(crate) fn table_mut(&mut self) -> &mut ChunkTable {
        &mut self.table
    }
}
