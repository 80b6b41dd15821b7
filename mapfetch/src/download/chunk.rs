//! Chunk and byte-range leaf types for the download scheduler.

use std::fmt;

/// A half-open byte range `[start, end)` within the target file.
///
/// Offsets are signed 64-bit to match the on-disk chunk record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// First byte of the range.
    pub start: i64,
    /// One past the last byte of the range.
    pub end: i64,
}

impl ByteRange {
    /// Create a new range. Callers are expected to pass `start <= end`.
    pub fn new(start: i64, end: i64) -> Self {
        debug_assert!(start <= end, "inverted byte range {}..{}", start, end);
        Self { start, end }
    }

    /// Length of the range in bytes.
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the range covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Status of a single chunk in the table.
///
/// An explicit enum rather than bare integer codes; the `u8` values are the
/// on-disk encoding used by the resume file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChunkStatus {
    /// Not yet downloaded, eligible for assignment.
    Free = 0,
    /// Currently assigned to a mirror.
    Downloading = 1,
    /// Durably downloaded.
    Complete = 2,
    /// Bookkeeping-only entry, excluded from scheduling.
    Aux = 3,
}

impl ChunkStatus {
    /// Decode a status byte from a resume file.
    ///
    /// Returns `None` for out-of-range values, which callers treat as
    /// resume-file corruption.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Free),
            1 => Some(Self::Downloading),
            2 => Some(Self::Complete),
            3 => Some(Self::Aux),
            _ => None,
        }
    }

    /// Encode this status as its on-disk byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One schedulable unit: a byte offset into the target file plus its status.
///
/// The end of a chunk is not stored; it is the position of the next chunk in
/// the table (or the file size for the last chunk).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Byte offset where this chunk starts.
    pub position: i64,
    /// Current status.
    pub status: ChunkStatus,
}

impl Chunk {
    /// Create a new chunk record.
    pub fn new(position: i64, status: ChunkStatus) -> Self {
        Self { position, status }
    }
}
