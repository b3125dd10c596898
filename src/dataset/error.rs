//! Error types for dataset fetches.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::metadata::Role;
use crate::cache::CacheError;
use crate::download::DownloadError;

/// Errors raised by a dataset fetch.
///
/// Every variant names the dataset and, where one is involved, the role and
/// local path of the offending file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// A required file is absent and downloads are disabled.
    #[error(
        "{dataset}/{role}: data not found at {path} and downloads are disabled (download_if_missing = false)"
    )]
    MissingData {
        /// Dataset name.
        dataset: String,
        /// Role of the missing file.
        role: Role,
        /// Where the file was expected.
        path: PathBuf,
    },

    /// A file's SHA-256 digest does not match its metadata.
    #[error(
        "{dataset}/{role}: integrity check failed for {path}: expected SHA-256 {expected}, got {actual}; file may be corrupted"
    )]
    Integrity {
        /// Dataset name.
        dataset: String,
        /// Role of the file.
        role: Role,
        /// Local path of the file that was checked.
        path: PathBuf,
        /// Digest recorded in the metadata.
        expected: String,
        /// Digest of the bytes on disk or received.
        actual: String,
    },

    /// Network transfer failed after the retry budget or with a permanent error.
    #[error(
        "{dataset}/{role}: failed to download {url} to {path} after {attempts} attempt(s): {source}"
    )]
    TransientFetch {
        /// Dataset name.
        dataset: String,
        /// Role of the file.
        role: Role,
        /// Destination path.
        path: PathBuf,
        /// Source URL.
        url: String,
        /// Network attempts made.
        attempts: u32,
        /// The last transport error.
        #[source]
        source: DownloadError,
    },

    /// The data home or dataset directory could not be created or read.
    #[error("{dataset}: filesystem error at {path}: {source}")]
    Filesystem {
        /// Dataset name.
        dataset: String,
        /// Path the operation targeted.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A declared file could not be read, written or placed at its final path.
    ///
    /// `io_path` is the path the failing operation touched, which may be the
    /// temporary download next to `path`.
    #[error("{dataset}/{role}: filesystem error for {path}{}: {source}", io_location(.path, .io_path))]
    FileAccess {
        /// Dataset name.
        dataset: String,
        /// Role of the file.
        role: Role,
        /// Where the file is expected.
        path: PathBuf,
        /// Path of the failing operation.
        io_path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The data home or dataset directory could not be resolved.
    #[error("{dataset}: {source}")]
    Cache {
        /// Dataset name.
        dataset: String,
        /// The cache failure.
        #[source]
        source: CacheError,
    },

    /// A file's metadata cannot be fetched as declared (e.g. a non-HTTP URL).
    #[error("{dataset}/{role}: invalid metadata for {path}: {reason}")]
    InvalidMetadata {
        /// Dataset name.
        dataset: String,
        /// Role of the file.
        role: Role,
        /// Where the file would be cached.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The bundle has no file for the requested role.
    #[error("{dataset}: no file for role '{role}'")]
    UnknownRole {
        /// Dataset name.
        dataset: String,
        /// The requested role.
        role: Role,
    },

    /// The catalog has no dataset with this name.
    #[error("unknown dataset '{name}'")]
    UnknownDataset {
        /// The requested name.
        name: String,
    },

    /// The dataset's description could not be loaded.
    #[error("{dataset}: description unavailable: {source}")]
    Description {
        /// Dataset name.
        dataset: String,
        /// The lookup failure.
        #[source]
        source: std::io::Error,
    },

    /// The downloader could not be built.
    #[error("failed to set up downloader: {source}")]
    Setup {
        /// The construction failure.
        #[source]
        source: DownloadError,
    },
}

impl FetchError {
    /// Maps a cache preparation failure for `dataset`.
    pub(crate) fn from_cache(dataset: &str, error: CacheError) -> Self {
        match error {
            CacheError::Io { path, source } => Self::Filesystem {
                dataset: dataset.to_string(),
                path,
                source,
            },
            CacheError::NotADirectory { path } => Self::Filesystem {
                dataset: dataset.to_string(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotADirectory,
                    "cache path exists but is not a directory",
                ),
                path,
            },
            other => Self::Cache {
                dataset: dataset.to_string(),
                source: other,
            },
        }
    }

    /// Maps a single-file download failure for `dataset`/`role` at `path`.
    pub(crate) fn from_download(
        dataset: &str,
        role: &Role,
        path: PathBuf,
        url: &str,
        error: DownloadError,
        attempts: u32,
    ) -> Self {
        match error {
            DownloadError::Integrity {
                expected, actual, ..
            } => Self::Integrity {
                dataset: dataset.to_string(),
                role: role.clone(),
                path,
                expected,
                actual,
            },
            DownloadError::Io {
                path: io_path,
                source,
            } => Self::FileAccess {
                dataset: dataset.to_string(),
                role: role.clone(),
                path,
                io_path,
                source,
            },
            DownloadError::InvalidUrl { url } => Self::InvalidMetadata {
                dataset: dataset.to_string(),
                role: role.clone(),
                path,
                reason: format!("URL '{url}' is not a valid http(s) URL"),
            },
            source @ DownloadError::ClientBuild { .. } => Self::Setup { source },
            transport => Self::TransientFetch {
                dataset: dataset.to_string(),
                role: role.clone(),
                path,
                url: url.to_string(),
                attempts,
                source: transport,
            },
        }
    }

    /// Whether retrying the whole fetch later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFetch { .. })
    }

    /// Dataset the failure belongs to, if any.
    #[must_use]
    pub fn dataset(&self) -> Option<&str> {
        match self {
            Self::MissingData { dataset, .. }
            | Self::Integrity { dataset, .. }
            | Self::TransientFetch { dataset, .. }
            | Self::Filesystem { dataset, .. }
            | Self::FileAccess { dataset, .. }
            | Self::Cache { dataset, .. }
            | Self::InvalidMetadata { dataset, .. }
            | Self::UnknownRole { dataset, .. }
            | Self::Description { dataset, .. } => Some(dataset),
            Self::UnknownDataset { .. } | Self::Setup { .. } => None,
        }
    }
}

fn io_location(path: &Path, io_path: &Path) -> String {
    if path == io_path {
        String::new()
    } else {
        format!(" (at {})", io_path.display())
    }
}
