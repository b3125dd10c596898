//! HTTP client wrapper for streaming dataset files to disk.
//!
//! This module provides the `HttpClient` struct which streams a response body
//! into a caller-chosen file while computing its SHA-256 on the fly, with
//! bounded connect and read timeouts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::RETRY_AFTER;
use sha2::{Digest, Sha256};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::checksum::finalize_hex;
use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for downloading files with streaming support.
///
/// This client is designed to be created once and reused for multiple downloads,
/// taking advantage of connection pooling.
///
/// Response bodies are written exactly as received. No `Content-Encoding` is
/// decoded, because recorded checksums cover the raw bytes the host serves.
///
/// # Example
///
/// ```no_run
/// use mdanalysis_data::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let streamed = client
///     .download_to_path("https://example.com/adk4AKE.psf", Path::new("./adk4AKE.psf.part"))
///     .await?;
/// println!("{} bytes, sha256 {}", streamed.bytes, streamed.sha256);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

/// A response body fully written to disk.
#[derive(Debug, Clone)]
pub struct StreamedFile {
    /// Where the body was written.
    pub path: PathBuf,
    /// Number of body bytes written.
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the written bytes.
    pub sha256: String,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between body chunks
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration
    /// (for example when no TLS backend can be initialised).
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
        .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// The read timeout applies to each read of the response, so a stalled
    /// transfer fails instead of hanging while large files still complete.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the underlying client cannot be built.
    pub fn with_timeouts(
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .user_agent(user_agent::default_download_user_agent())
            .build()
            .map_err(|source| DownloadError::ClientBuild { source })?;
        Ok(Self { client })
    }

    /// Streams `url` into a newly created file at `target`, hashing as it goes.
    ///
    /// `target` must not exist. On any failure the partially written file is
    /// removed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid or not HTTP(S)
    /// - The request fails (network error, timeout, redirect loop)
    /// - The server returns a non-success status
    /// - Creating or writing `target` fails
    #[must_use = "streamed file carries the digest that must be verified"]
    #[instrument(skip(self), fields(url = %url, target = %target.display()))]
    pub async fn download_to_path(
        &self,
        url: &str,
        target: &Path,
    ) -> Result<StreamedFile, DownloadError> {
        debug!("starting download");
        validate_url(url)?;

        let response = self.send_request(url).await?;

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .await
            .map_err(|e| DownloadError::io(target, e))?;

        match stream_to_file(file, response, url, target).await {
            Ok((bytes, sha256)) => {
                debug!(bytes, %sha256, "body written");
                Ok(StreamedFile {
                    path: target.to_path_buf(),
                    bytes,
                    sha256,
                })
            }
            Err(error) => {
                debug!(path = %target.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(target).await;
                Err(error)
            }
        }
    }

    async fn send_request(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(std::string::ToString::to_string);
            return Err(DownloadError::http_status_with_retry_after(
                url,
                status.as_u16(),
                retry_after,
            ));
        }

        Ok(response)
    }
}

/// Only absolute HTTP(S) URLs are fetched.
pub(crate) fn validate_url(url: &str) -> Result<Url, DownloadError> {
    let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(DownloadError::invalid_url(url)),
    }
}

/// Streams the response body to `file`, returning bytes written and the hex digest.
async fn stream_to_file(
    file: File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<(u64, String), DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut hasher = Sha256::new();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        hasher.update(&chunk);

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    // Data must be durable before the rename makes it visible.
    writer
        .get_ref()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok((bytes_written, finalize_hex(hasher)))
}
