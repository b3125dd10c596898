//! HTTP download of dataset files into the cache.
//!
//! This module streams remote files to disk, verifies their SHA-256 digest
//! and places them atomically, retrying transient network failures.
//!
//! # Features
//!
//! - Streaming downloads with inline hashing (memory-efficient for trajectories)
//! - Temp-file-then-rename placement; the final path only ever holds verified bytes
//! - Configurable timeouts (30s connect, 5min read by default)
//! - Bounded exponential backoff with jitter and Retry-After support
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use mdanalysis_data::download::{Downloader, DownloaderConfig};
//! use mdanalysis_data::RemoteFileMetadata;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(DownloaderConfig::default())?;
//! let meta = RemoteFileMetadata::new(
//!     "adk4AKE.psf",
//!     "https://ndownloader.figshare.com/files/8672230",
//!     "1aa947d58fb41b6805dc1e7be4dbe65c6a8f4690f0bd7fc2ae03e7bd437085f4",
//! )?;
//! let path = downloader.fetch(&meta, Path::new("./cache/adk_equilibrium"), false).await?;
//! println!("Cached: {}", path.display());
//! # Ok(())
//! # }
//! ```

mod checksum;
mod client;
mod constants;
mod downloader;
mod error;
mod retry;

pub use checksum::{checksums_match, sha256_file};
pub use client::{HttpClient, StreamedFile};
pub(crate) use client::validate_url;
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use downloader::{CacheState, Downloader, DownloaderConfig, VerifyPolicy};
pub use error::DownloadError;
pub use retry::{
    DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error,
    parse_retry_after,
};

// Note: no module-local Result aliases. Use `Result<T, DownloadError>` explicitly.
