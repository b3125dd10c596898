//! Verified, atomically placed downloads of single dataset files.
//!
//! A file moves through three states:
//!
//! ```text
//! ABSENT -> DOWNLOADING(.<filename>.<random>.part) -> VERIFIED(<filename>)
//! ```
//!
//! Any failure while downloading removes the temp file and returns to
//! `ABSENT`. The final filename only appears through a rename inside the
//! destination directory after the SHA-256 digest matched, so concurrent
//! processes sharing a cache never observe a partial or unverified file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use super::checksum::{checksums_match, sha256_file};
use super::client::HttpClient;
use super::constants::{CONNECT_TIMEOUT_SECS, PARTIAL_SUFFIX, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::retry::{RetryDecision, RetryPolicy, classify_error, retry_after_delay};
use crate::dataset::RemoteFileMetadata;

/// How a file already present in the cache is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VerifyPolicy {
    /// Re-hash cached files and compare with the recorded checksum.
    #[default]
    Checksum,
    /// Trust any file present at the final path.
    ExistenceOnly,
}

/// Connection, retry and verification settings for a [`Downloader`].
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle time between reads of a response.
    pub read_timeout: Duration,
    /// Bounded retry schedule for transient failures.
    pub retry_policy: RetryPolicy,
    /// Trust model for files already in the cache.
    pub verify: VerifyPolicy,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
            verify: VerifyPolicy::default(),
        }
    }
}

impl DownloaderConfig {
    /// Sets connect and read timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, read_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.read_timeout = read_timeout;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the cache verification policy.
    #[must_use]
    pub fn with_verify(mut self, verify: VerifyPolicy) -> Self {
        self.verify = verify;
        self
    }
}

/// What the cache currently holds for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing at the final path.
    Absent,
    /// A file is present and trusted under the active [`VerifyPolicy`].
    Verified,
    /// A file is present but its digest does not match.
    Corrupt {
        /// Digest of the file on disk.
        actual: String,
    },
}

/// Downloads single files into a cache directory with retry and verification.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: HttpClient,
    retry_policy: RetryPolicy,
    verify: VerifyPolicy,
}

impl Downloader {
    /// Builds a downloader and its HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: DownloaderConfig) -> Result<Self, DownloadError> {
        let client = HttpClient::with_timeouts(config.connect_timeout, config.read_timeout)?;
        Ok(Self::with_client(client, config.retry_policy, config.verify))
    }

    /// Creates a downloader around an existing client.
    #[must_use]
    pub fn with_client(client: HttpClient, retry_policy: RetryPolicy, verify: VerifyPolicy) -> Self {
        Self {
            client,
            retry_policy,
            verify,
        }
    }

    /// Returns the active verification policy.
    #[must_use]
    pub fn verify_policy(&self) -> VerifyPolicy {
        self.verify
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Reports whether `dest_dir/<filename>` is usable without network access.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] if the path cannot be inspected, is not a
    /// regular file, or cannot be hashed.
    pub async fn inspect(
        &self,
        metadata: &RemoteFileMetadata,
        dest_dir: &Path,
    ) -> Result<CacheState, DownloadError> {
        let final_path = dest_dir.join(metadata.filename());
        inspect_path(&final_path, metadata, self.verify).await
    }

    /// Returns the local path of `metadata` in `dest_dir`, downloading it if needed.
    ///
    /// With `force == false` a trusted cached file is returned without any
    /// network access. Otherwise the file is streamed to a temp file, verified
    /// and renamed into place. Transient failures are retried per the
    /// [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Integrity`] when the downloaded digest does not match
    /// - [`DownloadError::Io`] for local filesystem failures (never retried)
    /// - Transport errors once retries are exhausted or the failure is permanent
    pub async fn fetch(
        &self,
        metadata: &RemoteFileMetadata,
        dest_dir: &Path,
        force: bool,
    ) -> Result<PathBuf, DownloadError> {
        self.fetch_counting(metadata, dest_dir, force)
            .await
            .map_err(|(error, _)| error)
    }

    /// Like [`fetch`](Self::fetch) but reports the number of network attempts on failure.
    #[instrument(
        skip(self, metadata, dest_dir),
        fields(filename = %metadata.filename(), url = %metadata.url())
    )]
    pub(crate) async fn fetch_counting(
        &self,
        metadata: &RemoteFileMetadata,
        dest_dir: &Path,
        force: bool,
    ) -> Result<PathBuf, (DownloadError, u32)> {
        let final_path = dest_dir.join(metadata.filename());

        if !force {
            match self.inspect(metadata, dest_dir).await.map_err(|e| (e, 0))? {
                CacheState::Verified => {
                    debug!(path = %final_path.display(), "cache hit");
                    return Ok(final_path);
                }
                CacheState::Corrupt { actual } => {
                    warn!(
                        path = %final_path.display(),
                        expected = %metadata.checksum(),
                        %actual,
                        "cached file failed checksum verification, re-downloading"
                    );
                }
                CacheState::Absent => {}
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(attempt, "attempting download");

            match self.download_once(metadata, dest_dir, &final_path).await {
                Ok(bytes) => {
                    info!(
                        path = %final_path.display(),
                        bytes,
                        attempts = attempt,
                        "download complete"
                    );
                    return Ok(final_path);
                }
                Err(e) => {
                    let failure_type = classify_error(&e);
                    match self.retry_policy.should_retry(failure_type, attempt) {
                        RetryDecision::Retry {
                            delay: backoff_delay,
                            attempt: next_attempt,
                        } => {
                            let retry_after = retry_after_delay(&e);
                            let delay = retry_after.unwrap_or(backoff_delay);
                            warn!(
                                attempt = next_attempt,
                                max_attempts = self.retry_policy.max_attempts(),
                                delay_ms = delay.as_millis(),
                                using_retry_after = retry_after.is_some(),
                                error = %e,
                                "retrying download"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(%reason, "not retrying download");
                            return Err((e, attempt));
                        }
                    }
                }
            }
        }
    }

    /// One network attempt: stream to a temp file, verify, rename into place.
    async fn download_once(
        &self,
        metadata: &RemoteFileMetadata,
        dest_dir: &Path,
        final_path: &Path,
    ) -> Result<u64, DownloadError> {
        let temp_path = partial_path(dest_dir, metadata.filename());
        debug!(temp = %temp_path.display(), "downloading to temp file");

        let streamed = self
            .client
            .download_to_path(metadata.url(), &temp_path)
            .await?;

        if !checksums_match(metadata.checksum(), &streamed.sha256) {
            remove_quietly(&temp_path).await;
            return Err(DownloadError::integrity(
                final_path,
                metadata.checksum(),
                streamed.sha256,
            ));
        }

        self.place_verified(&temp_path, final_path, metadata).await?;
        Ok(streamed.bytes)
    }

    /// Renames a verified temp file onto the final path.
    ///
    /// If the rename fails but another writer already placed a file that
    /// verifies, that file is reused.
    async fn place_verified(
        &self,
        temp_path: &Path,
        final_path: &Path,
        metadata: &RemoteFileMetadata,
    ) -> Result<(), DownloadError> {
        let Err(rename_error) = tokio::fs::rename(temp_path, final_path).await else {
            return Ok(());
        };

        remove_quietly(temp_path).await;
        if matches!(
            inspect_path(final_path, metadata, VerifyPolicy::Checksum).await,
            Ok(CacheState::Verified)
        ) {
            debug!(
                path = %final_path.display(),
                "rename lost to a concurrent writer, reusing verified file"
            );
            return Ok(());
        }
        Err(DownloadError::io(final_path, rename_error))
    }
}

async fn inspect_path(
    path: &Path,
    metadata: &RemoteFileMetadata,
    verify: VerifyPolicy,
) -> Result<CacheState, DownloadError> {
    let file_meta = match tokio::fs::metadata(path).await {
        Ok(file_meta) => file_meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheState::Absent),
        Err(e) => return Err(DownloadError::io(path, e)),
    };
    if !file_meta.is_file() {
        return Err(DownloadError::io(
            path,
            std::io::Error::other("cache entry exists but is not a regular file"),
        ));
    }

    if verify == VerifyPolicy::ExistenceOnly {
        return Ok(CacheState::Verified);
    }

    let actual = sha256_file(path).await?;
    if checksums_match(metadata.checksum(), &actual) {
        Ok(CacheState::Verified)
    } else {
        Ok(CacheState::Corrupt { actual })
    }
}

/// Unique in-flight path next to the final file: `.<filename>.<random>.part`.
fn partial_path(dest_dir: &Path, filename: &str) -> PathBuf {
    let nonce: u64 = rand::thread_rng().r#gen();
    dest_dir.join(format!(".{filename}.{nonce:016x}{PARTIAL_SUFFIX}"))
}

async fn remove_quietly(path: &Path) {
    if let Err(error) = tokio::fs::remove_file(path).await
        && error.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), %error, "failed to remove temp file");
    }
}
