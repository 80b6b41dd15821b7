//! The chunk table: an ordered partition of the target file into ranges.
//!
//! The table owns a position-sorted vector of [`Chunk`] records covering
//! `[0, file_size)` with no gaps and no overlaps. The end offset of chunk
//! `i` is the position of chunk `i + 1`, or `file_size` for the last chunk.
//! Lookups return indices into the owned vector; all mutation goes through
//! the table so no interior references escape.

use crate::download::chunk::{ByteRange, Chunk, ChunkStatus};
use crate::error::{DownloadError, DownloadResult};

/// Position-sorted table of chunks partitioning `[0, file_size)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTable {
    chunks: Vec<Chunk>,
    file_size: i64,
}

impl ChunkTable {
    /// Build a fresh table of `Free` chunks.
    ///
    /// Produces `ceil(file_size / chunk_size)` chunks of `chunk_size` bytes
    /// each, except possibly a shorter final chunk.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidChunking`] if either size is not
    /// strictly positive.
    pub fn init(file_size: i64, chunk_size: i64) -> DownloadResult<Self> {
        Self::init_with_status(file_size, chunk_size, ChunkStatus::Free)
    }

    /// Build a fresh table with every chunk in the given status.
    pub fn init_with_status(
        file_size: i64,
        chunk_size: i64,
        status: ChunkStatus,
    ) -> DownloadResult<Self> {
        if file_size <= 0 || chunk_size <= 0 {
            return Err(DownloadError::InvalidChunking {
                file_size,
                chunk_size,
            });
        }

        let count = Self::chunk_count(file_size, chunk_size);
        let chunks = (0..count)
            .map(|i| Chunk::new(i * chunk_size, status))
            .collect();

        Ok(Self { chunks, file_size })
    }

    /// Number of chunks a file of `file_size` splits into.
    pub fn chunk_count(file_size: i64, chunk_size: i64) -> i64 {
        (file_size + chunk_size - 1) / chunk_size
    }

    /// Assemble a table from already-validated parts.
    ///
    /// Used by the resume loader; callers guarantee the chunks are sorted by
    /// ascending position.
    pub(crate) fn from_parts(chunks: Vec<Chunk>, file_size: i64) -> Self {
        debug_assert!(chunks.windows(2).all(|w| w[0].position < w[1].position));
        Self { chunks, file_size }
    }

    /// Size of the target file this table partitions.
    pub fn file_size(&self) -> i64 {
        self.file_size
    }

    /// Number of chunks in the table.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the table holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// All chunks, in ascending position order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Locate the chunk starting exactly at `start`.
    ///
    /// Ranges handed out by the scheduler are always chunk-aligned, so a
    /// miss here means the caller reported a range it was never given.
    pub fn find(&self, start: i64) -> Option<usize> {
        self.chunks
            .binary_search_by_key(&start, |chunk| chunk.position)
            .ok()
    }

    /// The byte range covered by the chunk at `index`.
    pub fn range_of(&self, index: usize) -> ByteRange {
        let start = self.chunks[index].position;
        let end = self
            .chunks
            .get(index + 1)
            .map(|next| next.position)
            .unwrap_or(self.file_size);
        ByteRange::new(start, end)
    }

    /// Status of the chunk at `index`.
    pub fn status_of(&self, index: usize) -> ChunkStatus {
        self.chunks[index].status
    }

    /// Set the status of the chunk at `index`.
    pub fn set_status(&mut self, index: usize, status: ChunkStatus) {
        self.chunks[index].status = status;
    }

    /// Inject a chunk outside the normal `init` sequence.
    ///
    /// Test escape hatch: inserts a record at `range.start` (typically
    /// tagged [`ChunkStatus::Aux`]) while keeping the table sorted. The
    /// ordinary scheduling path never calls this.
    pub fn add_chunk(&mut self, range: ByteRange, status: ChunkStatus) {
        let chunk = Chunk::new(range.start, status);
        let at = self
            .chunks
            .partition_point(|c| c.position < chunk.position);
        self.chunks.insert(at, chunk);
    }

    /// Index of the first chunk in the given status, in position order.
    pub fn first_with_status(&self, status: ChunkStatus) -> Option<usize> {
        self.chunks.iter().position(|chunk| chunk.status == status)
    }

    /// Number of chunks currently in the given status.
    pub fn count_with_status(&self, status: ChunkStatus) -> usize {
        self.chunks
            .iter()
            .filter(|chunk| chunk.status == status)
            .count()
    }

    /// Total bytes covered by `Complete` chunks.
    pub fn bytes_complete(&self) -> i64 {
        (0..self.chunks.len())
            .filter(|&i| self.chunks[i].status == ChunkStatus::Complete)
            .map(|i| self.range_of(i).len())
            .sum()
    }

    /// Whether every schedulable (non-`Aux`) chunk is `Complete`.
    pub fn all_complete(&self) -> bool {
        self.chunks
            .iter()
            .all(|chunk| matches!(chunk.status, ChunkStatus::Complete | ChunkStatus::Aux))
    }
}
