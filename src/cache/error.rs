//! Error types for cache directory resolution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while resolving or preparing cache directories.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Neither an override, `MDANALYSIS_DATA`, nor `HOME` is available.
    #[error("unable to determine data home (set MDANALYSIS_DATA or HOME)")]
    HomeUnavailable,

    /// Dataset name cannot be used as a single directory segment.
    #[error("invalid dataset name '{name}': {reason}")]
    InvalidDatasetName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// A non-directory entry occupies a path that must be a directory.
    #[error("cache path {path} exists but is not a directory")]
    NotADirectory {
        /// The occupied path.
        path: PathBuf,
    },

    /// Filesystem operation failed.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path the operation targeted.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid dataset name error.
    pub fn invalid_name(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidDatasetName {
            name: name.into(),
            reason,
        }
    }

    /// Returns the path involved in the failure, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::NotADirectory { path } | Self::Io { path, .. } => Some(path),
            Self::HomeUnavailable | Self::InvalidDatasetName { .. } => None,
        }
    }
}
