//! Resume-file persistence for the chunk table.
//!
//! The on-disk format is a flat sequence of fixed-width 9-byte records, one
//! per chunk in ascending position order:
//!
//! ```text
//! ┌──────────────────────┬────────┐
//! │ position: i64 (LE)   │ status │   × N, N = ceil(file_size / chunk_size)
//! └──────────────────────┴────────┘
//! ```
//!
//! There is no header or padding, so a 4-chunk table is exactly 36 bytes.
//! Each field is serialized explicitly rather than through in-memory struct
//! layout, keeping the format identical across platforms. Little-endian is
//! used so a resume file written on one architecture loads on another.
//!
//! Loading validates the file strictly against the expected partition for
//! the current `file_size`/`chunk_size`; anything that does not match
//! (truncation, garbage, a table from a different session) is rejected and
//! the caller starts a fresh download instead.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::download::chunk::{Chunk, ChunkStatus};
use crate::download::table::ChunkTable;
use crate::error::{DownloadError, DownloadResult};

/// Size of one on-disk chunk record: an `i64` position plus a status byte.
pub const RECORD_SIZE: usize = 9;

/// Serialize the chunk table to `path`, overwriting any prior content.
///
/// Writes to a temp file and renames it into place so a crash mid-save
/// never leaves a torn resume file behind.
pub fn save_table(table: &ChunkTable, path: &Path) -> DownloadResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| DownloadError::WriteFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let file = fs::File::create(&temp_path).map_err(|e| DownloadError::WriteFailed {
        path: temp_path.clone(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let write_err = |e| DownloadError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    for chunk in table.chunks() {
        writer
            .write_all(&chunk.position.to_le_bytes())
            .map_err(write_err)?;
        writer.write_all(&[chunk.status.as_u8()]).map_err(write_err)?;
    }
    writer.flush().map_err(write_err)?;

    fs::rename(&temp_path, path).map_err(|e| DownloadError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        chunks = table.len(),
        bytes_complete = table.bytes_complete(),
        "saved chunk table"
    );

    Ok(())
}

/// Try to load a previously saved chunk table.
///
/// Returns `None` if the file is missing, truncated, or does not describe
/// the expected partition of `[0, file_size)` into `chunk_size` pieces.
/// Chunks recorded as `Downloading` belong to a session that no longer
/// exists and come back as `Free`.
pub fn load_table(path: &Path, file_size: i64, chunk_size: i64) -> Option<ChunkTable> {
    if file_size <= 0 || chunk_size <= 0 {
        return None;
    }

    let data = match fs::read(path) {
        Ok(data) => data,
        Err(_) => {
            tracing::debug!(path = %path.display(), "no resume file, starting fresh");
            return None;
        }
    };

    let table = parse_records(&data, file_size, chunk_size);
    match &table {
        Some(table) => {
            tracing::info!(
                path = %path.display(),
                chunks = table.len(),
                bytes_complete = table.bytes_complete(),
                "resuming from saved chunk table"
            );
        }
        None => {
            tracing::warn!(
                path = %path.display(),
                len = data.len(),
                "resume file invalid for this session, starting fresh"
            );
        }
    }
    table
}

/// Parse and validate raw resume-file bytes.
fn parse_records(data: &[u8], file_size: i64, chunk_size: i64) -> Option<ChunkTable> {
    if data.len() % RECORD_SIZE != 0 {
        return None;
    }

    let expected = ChunkTable::chunk_count(file_size, chunk_size);
    if (data.len() / RECORD_SIZE) as i64 != expected {
        return None;
    }

    let mut chunks = Vec::with_capacity(expected as usize);
    for (i, record) in data.chunks_exact(RECORD_SIZE).enumerate() {
        let position = i64::from_le_bytes(record[..8].try_into().ok()?);
        if position != i as i64 * chunk_size {
            return None;
        }

        let mut status = ChunkStatus::from_u8(record[8])?;
        if status == ChunkStatus::Downloading {
            // No transfer survived the previous session.
            status = ChunkStatus::Free;
        }

        chunks.push(Chunk::new(position, status));
    }

    Some(ChunkTable::from_parts(chunks, file_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::TempDir;

    fn resume_path(temp: &TempDir) -> std::path::PathBuf {
        temp.path().join("europe.mwm.resume")
    }

    #[test]
    fn test_record_layout_is_nine_bytes() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let table = ChunkTable::init(1000, 300).unwrap();
        save_table(&table, &path).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(data.len(), 4 * RECORD_SIZE);
        // First record: position 0, status Free.
        assert_eq!(&data[..9], &[0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // Second record starts at position 300 little-endian.
        assert_eq!(i64::from_le_bytes(data[9..17].try_into().unwrap()), 300);
    }

    #[test]
    fn test_roundtrip_preserves_statuses() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let mut table = ChunkTable::init(1000, 300).unwrap();
        table.set_status(0, ChunkStatus::Complete);
        table.set_status(2, ChunkStatus::Aux);
        save_table(&table, &path).unwrap();

        let loaded = load_table(&path, 1000, 300).unwrap();
        assert_eq!(loaded, table);
        assert_eq!(loaded.bytes_complete(), 300);
    }

    #[test]
    fn test_stale_downloading_reset_to_free() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let mut table = ChunkTable::init(1000, 300).unwrap();
        table.set_status(1, ChunkStatus::Downloading);
        save_table(&table, &path).unwrap();

        let loaded = load_table(&path, 1000, 300).unwrap();
        assert_eq!(loaded.status_of(1), ChunkStatus::Free);
        assert_eq!(loaded.count_with_status(ChunkStatus::Downloading), 0);
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let temp = TempDir::new().unwrap();
        assert!(load_table(&resume_path(&temp), 1000, 300).is_none());
    }

    #[test]
    fn test_truncated_file_rejected() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let table = ChunkTable::init(1000, 300).unwrap();
        save_table(&table, &path).unwrap();

        let mut data = fs::read(&path).unwrap();
        data.truncate(data.len() - 5);
        fs::write(&path, &data).unwrap();

        assert!(load_table(&path, 1000, 300).is_none());
    }

    #[test]
    fn test_garbage_file_rejected() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        // Right length for 4 records, random content.
        let mut data = vec![0u8; 4 * RECORD_SIZE];
        rand::rng().fill(&mut data[..]);
        // Force at least one position mismatch even if the fill got lucky.
        data[0] = 0xEE;
        fs::write(&path, &data).unwrap();

        assert!(load_table(&path, 1000, 300).is_none());
    }

    #[test]
    fn test_session_mismatch_rejected() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let table = ChunkTable::init(1000, 300).unwrap();
        save_table(&table, &path).unwrap();

        // Same file, different chunking: record count and positions differ.
        assert!(load_table(&path, 1000, 250).is_none());
        assert!(load_table(&path, 1300, 300).is_none());
    }

    #[test]
    fn test_bad_status_byte_rejected() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        let table = ChunkTable::init(600, 300).unwrap();
        save_table(&table, &path).unwrap();

        let mut data = fs::read(&path).unwrap();
        data[8] = 9;
        fs::write(&path, &data).unwrap();

        assert!(load_table(&path, 600, 300).is_none());
    }

    #[test]
    fn test_save_overwrites_previous_file() {
        let temp = TempDir::new().unwrap();
        let path = resume_path(&temp);

        save_table(&ChunkTable::init(1000, 300).unwrap(), &path).unwrap();
        save_table(&ChunkTable::init(600, 300).unwrap(), &path).unwrap();

        assert_eq!(fs::read(&path).unwrap().len(), 2 * RECORD_SIZE);
    }
}
