//! Chunked multi-mirror download manager.
//!
//! This module downloads a single large file in fixed-size byte ranges from
//! a pool of equivalent mirror servers, including:
//! - Chunk table bookkeeping over `[0, file_size)` (`chunk`, `table`)
//! - Mirror idle/busy tracking (`pool`)
//! - The chunk-to-mirror assignment state machine (`scheduler`)
//! - Resume-file persistence (`resume`)
//! - Blocking HTTP range fetches (`http`)
//! - SHA-256 verification of the assembled file (`checksum`)
//! - Progress snapshots and callbacks (`progress`)
//! - End-to-end orchestration with worker threads (`orchestrator`)
//!
//! # Architecture
//!
//! ```text
//! MirrorDownloader (orchestrator)
//!         │
//!         ├── ChunkScheduler (which range from which mirror next?)
//!         │       ├── ChunkTable  (partition of [0, file_size))
//!         │       └── ServerPool  (idle/busy mirrors)
//!         │
//!         ├── RangeFetcher (blocking HTTP range requests)
//!         │
//!         └── resume (save / load-or-init of the chunk table)
//! ```
//!
//! The scheduler itself performs no I/O and is explicitly single-threaded:
//! the orchestrator pulls assignments out of it, runs the transfers on worker
//! threads, and feeds completion reports back one at a time.
//!
//! # Example
//!
//! ```ignore
//! use mapfetch::download::{ChunkScheduler, NextChunk};
//!
//! let mut scheduler = ChunkScheduler::new(vec![
//!     "https://mirror-a.example.com/europe.mwm".to_string(),
//!     "https://mirror-b.example.com/europe.mwm".to_string(),
//! ])?;
//! scheduler.init_chunks(file_size, 4 * 1024 * 1024)?;
//!
//! while let NextChunk::Assigned(assignment) = scheduler.next_chunk() {
//!     // fetch assignment.range from assignment.url out of band, then:
//!     scheduler.chunk_finished(true, assignment.range)?;
//! }
//! ```

mod checksum;
mod chunk;
mod http;
mod orchestrator;
mod pool;
mod progress;
mod resume;
mod scheduler;
mod table;

pub use checksum::{file_sha256, verify_file};
pub use chunk::{ByteRange, Chunk, ChunkStatus};
pub use http::RangeFetcher;
pub use orchestrator::MirrorDownloader;
pub use pool::{Mirror, ServerPool};
pub use progress::{DownloadProgress, ProgressCallback};
pub use resume::{load_table, save_table, RECORD_SIZE};
pub use scheduler::{Assignment, ChunkScheduler, NextChunk};
pub use table::ChunkTable;
