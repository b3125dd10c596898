//! Dataset description lookup.

use std::io;
use std::path::{Path, PathBuf};

use crate::cache::validate_dataset_name;

/// Extension of description files on disk.
const DESCRIPTION_EXT: &str = "rst";

/// Source of human-readable dataset descriptions.
pub trait DescriptionStore: Send + Sync {
    /// Returns the description text for `dataset`.
    ///
    /// # Errors
    ///
    /// Returns an IO error (usually [`io::ErrorKind::NotFound`]) when no
    /// description exists.
    fn describe(&self, dataset: &str) -> io::Result<String>;
}

impl<F> DescriptionStore for F
where
    F: Fn(&str) -> io::Result<String> + Send + Sync,
{
    fn describe(&self, dataset: &str) -> io::Result<String> {
        self(dataset)
    }
}

/// Descriptions compiled into the binary, keyed by dataset name.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedDescriptions {
    entries: &'static [(&'static str, &'static str)],
}

impl EmbeddedDescriptions {
    /// Wraps a static `(name, text)` table.
    #[must_use]
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }
}

impl DescriptionStore for EmbeddedDescriptions {
    fn describe(&self, dataset: &str) -> io::Result<String> {
        self.entries
            .iter()
            .find(|(name, _)| *name == dataset)
            .map(|(_, text)| (*text).to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no embedded description for '{dataset}'"),
                )
            })
    }
}

/// Descriptions read from `<dir>/<dataset>.rst`.
#[derive(Debug, Clone)]
pub struct DirectoryDescriptions {
    dir: PathBuf,
}

impl DirectoryDescriptions {
    /// Reads descriptions from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory searched for description files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DescriptionStore for DirectoryDescriptions {
    fn describe(&self, dataset: &str) -> io::Result<String> {
        validate_dataset_name(dataset)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let path = self.dir.join(format!("{dataset}.{DESCRIPTION_EXT}"));
        std::fs::read_to_string(&path).map_err(|e| {
            io::Error::new(e.kind(), format!("{}: {e}", path.display()))
        })
    }
}
