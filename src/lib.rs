//! MDAnalysis Data Library
//!
//! Fetches named molecular-dynamics example datasets from a remote content
//! host, caches them under a local data home and verifies every file against
//! its recorded SHA-256 checksum before handing out paths.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`cache`] - Data home resolution and per-dataset cache directories
//! - [`download`] - Streaming HTTP downloads with retry, checksum and atomic placement
//! - [`dataset`] - Dataset specs, the fetch orchestrator, result bundles and the catalog
//!
//! # Example
//!
//! ```no_run
//! use mdanalysis_data::{FetchOptions, Role, fetch_adk_equilibrium};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = fetch_adk_equilibrium(&FetchOptions::default()).await?;
//! println!("topology: {}", bundle.path(&Role::Topology)?.display());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod dataset;
pub mod download;
#[cfg(test)]
pub(crate) mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use cache::{
    CacheError, DATA_HOME_ENV, DEFAULT_DATA_HOME_DIR, clear_data_home, ensure_dataset_dir,
    resolve_data_home,
};
pub use dataset::{
    Bundle, Catalog, DatasetFetcher, DatasetSpec, DescriptionStore, DirectoryDescriptions,
    EmbeddedDescriptions, FetchError, FetchOptions, RemoteFileMetadata, Role, SpecError,
    fetch_adk_equilibrium, fetch_ifabp_water,
};
pub use download::{
    DEFAULT_MAX_RETRIES, DownloadError, Downloader, DownloaderConfig, FailureType, HttpClient,
    RetryDecision, RetryPolicy, VerifyPolicy, classify_error, sha256_file,
};
