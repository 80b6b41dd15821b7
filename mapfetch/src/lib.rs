//! MapFetch - chunked, resumable downloads of large map packages.
//!
//! This library downloads large data files (regional map packages, elevation
//! sets, and similar multi-gigabyte artifacts) in fixed-size byte ranges from
//! a pool of equivalent mirror servers. Progress is persisted to disk so an
//! interrupted download resumes without re-fetching completed ranges.
//!
//! The heart of the crate is [`download::ChunkScheduler`], a synchronous
//! bookkeeping state machine that decides which byte range to fetch next from
//! which mirror. Actual transfers are performed by [`download::RangeFetcher`]
//! (or any other HTTP client the caller prefers) and driven end to end by
//! [`download::MirrorDownloader`].

pub mod config;
pub mod download;
pub mod error;

pub use config::DownloadConfig;
pub use error::{DownloadError, DownloadResult};

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
