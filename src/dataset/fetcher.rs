//! Orchestrates a whole-dataset fetch.
//!
//! A fetch runs in two phases. The pre-flight phase inspects every declared
//! file without touching the network and decides, per file, whether the
//! cached copy is used, downloaded or skipped. If any required file cannot be
//! satisfied (absent or corrupt with downloads disabled) the fetch fails
//! before anything is written. The second phase downloads the files that
//! need it, one at a time in declaration order, then attaches the
//! description.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::bundle::{Bundle, BundleFile};
use super::describe::DescriptionStore;
use super::error::FetchError;
use super::metadata::{DatasetSpec, SpecEntry};
use crate::cache::{ensure_dataset_dir, resolve_data_home};
use crate::download::{CacheState, DownloadError, Downloader, DownloaderConfig, validate_url};

/// Per-call fetch options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Overrides `MDANALYSIS_DATA` and `$HOME/MDAnalysis_data`.
    pub data_home: Option<PathBuf>,
    /// Download files that are absent or corrupt. When `false` the fetch never
    /// touches the network.
    pub download_if_missing: bool,
    /// Re-download every file even if a verified copy is cached.
    pub force: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            data_home: None,
            download_if_missing: true,
            force: false,
        }
    }
}

impl FetchOptions {
    /// Uses `data_home` as the cache root.
    #[must_use]
    pub fn with_data_home(mut self, data_home: impl Into<PathBuf>) -> Self {
        self.data_home = Some(data_home.into());
        self
    }

    /// Sets whether missing or corrupt files are downloaded.
    #[must_use]
    pub fn with_download_if_missing(mut self, download_if_missing: bool) -> Self {
        self.download_if_missing = download_if_missing;
        self
    }

    /// Disables all network access.
    #[must_use]
    pub fn offline(self) -> Self {
        self.with_download_if_missing(false)
    }

    /// Sets whether cached files are re-downloaded.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// What the pre-flight phase decided for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Use,
    Download,
    Skip,
}

/// Fetches whole datasets through a shared [`Downloader`].
#[derive(Debug, Clone)]
pub struct DatasetFetcher {
    downloader: Downloader,
}

impl DatasetFetcher {
    /// Builds a fetcher with a new downloader.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        Ok(Self::with_downloader(Downloader::new(config)?))
    }

    /// Wraps an existing downloader.
    #[must_use]
    pub fn with_downloader(downloader: Downloader) -> Self {
        Self { downloader }
    }

    /// The downloader used for single files.
    #[must_use]
    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Ensures every file of `spec` is cached and verified under the data
    /// home, returning their paths and the dataset description.
    ///
    /// # Errors
    ///
    /// - [`FetchError::MissingData`] / [`FetchError::Integrity`] from the
    ///   pre-flight phase when downloads are disabled; nothing is written
    /// - [`FetchError::InvalidMetadata`] for a file whose URL cannot be fetched
    /// - [`FetchError::TransientFetch`] when a transfer fails
    /// - [`FetchError::Integrity`] when downloaded bytes do not match
    /// - [`FetchError::FileAccess`] when a declared file cannot be read or placed
    /// - [`FetchError::Filesystem`] / [`FetchError::Cache`] for directory failures
    /// - [`FetchError::Description`] when no description is available
    #[instrument(
        skip(self, spec, descriptions, options),
        fields(dataset = %name, files = spec.len(), offline = !options.download_if_missing)
    )]
    pub async fn fetch(
        &self,
        name: &str,
        spec: &DatasetSpec,
        descriptions: &dyn DescriptionStore,
        options: &FetchOptions,
    ) -> Result<Bundle, FetchError> {
        let data_home = resolve_data_home(options.data_home.as_deref())
            .map_err(|e| FetchError::from_cache(name, e))?;
        let dataset_dir =
            ensure_dataset_dir(&data_home, name).map_err(|e| FetchError::from_cache(name, e))?;
        debug!(dir = %dataset_dir.display(), "resolved dataset directory");

        let plan = self.plan(name, spec, &dataset_dir, options).await?;

        let mut files = Vec::with_capacity(plan.len());
        let mut downloaded = 0usize;
        for (entry, action) in plan {
            let role = entry.role();
            let metadata = entry.metadata();
            let final_path = dataset_dir.join(metadata.filename());
            match action {
                Action::Use => {
                    debug!(%role, path = %final_path.display(), "using cached file");
                }
                Action::Skip => {
                    debug!(%role, "optional file absent, skipping");
                    continue;
                }
                Action::Download => {
                    info!(%role, url = %metadata.url(), "downloading");
                    self.downloader
                        .fetch_counting(metadata, &dataset_dir, true)
                        .await
                        .map_err(|(error, attempts)| {
                            FetchError::from_download(
                                name,
                                role,
                                final_path.clone(),
                                metadata.url(),
                                error,
                                attempts,
                            )
                        })?;
                    downloaded += 1;
                }
            }
            files.push(BundleFile {
                role: role.clone(),
                path: final_path,
            });
        }

        let description = descriptions
            .describe(name)
            .map_err(|source| FetchError::Description {
                dataset: name.to_string(),
                source,
            })?;

        info!(files = files.len(), downloaded, "dataset ready");
        Ok(Bundle::new(name, files, description))
    }

    /// Decides the action for every entry without network access.
    async fn plan<'a>(
        &self,
        name: &str,
        spec: &'a DatasetSpec,
        dataset_dir: &Path,
        options: &FetchOptions,
    ) -> Result<Vec<(&'a SpecEntry, Action)>, FetchError> {
        let force = options.force && options.download_if_missing;
        if options.force && !options.download_if_missing {
            warn!("force is ignored while downloads are disabled");
        }

        let mut plan = Vec::with_capacity(spec.len());
        for entry in spec.entries() {
            let role = entry.role();
            let metadata = entry.metadata();
            let final_path = dataset_dir.join(metadata.filename());

            let action = if force {
                Action::Download
            } else {
                let state = self
                    .downloader
                    .inspect(metadata, dataset_dir)
                    .await
                    .map_err(|e| {
                        FetchError::from_download(name, role, final_path.clone(), metadata.url(), e, 0)
                    })?;
                match (state, options.download_if_missing) {
                    (CacheState::Verified, _) => Action::Use,
                    (_, true) => Action::Download,
                    (CacheState::Absent, false) if entry.is_optional() => Action::Skip,
                    (CacheState::Absent, false) => {
                        return Err(FetchError::MissingData {
                            dataset: name.to_string(),
                            role: role.clone(),
                            path: final_path,
                        });
                    }
                    (CacheState::Corrupt { actual }, false) => {
                        return Err(FetchError::Integrity {
                            dataset: name.to_string(),
                            role: role.clone(),
                            path: final_path,
                            expected: metadata.checksum().to_string(),
                            actual,
                        });
                    }
                }
            };

            if action == Action::Download {
                validate_url(metadata.url()).map_err(|e| {
                    FetchError::from_download(name, role, final_path.clone(), metadata.url(), e, 0)
                })?;
            }
            plan.push((entry, action));
        }
        Ok(plan)
    }
}
