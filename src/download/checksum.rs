//! SHA-256 checksums of cached and in-flight files.
//!
//! Digests are compared as lowercase hex. Downloads hash inline while
//! streaming; files already on disk are hashed in bounded chunks.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use super::constants::HASH_BUFFER_SIZE;
use super::error::DownloadError;

/// Computes the SHA-256 of a file and returns the digest as lowercase hex.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the file cannot be opened or read.
pub async fn sha256_file(path: &Path) -> Result<String, DownloadError> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| DownloadError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .await
            .map_err(|e| DownloadError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(finalize_hex(hasher))
}

/// Finishes a running digest as lowercase hex.
pub(crate) fn finalize_hex(hasher: Sha256) -> String {
    hex::encode(hasher.finalize())
}

/// Compares two hex digests ignoring case and surrounding whitespace.
#[must_use]
pub fn checksums_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const HELLO_SHA256: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[tokio::test]
    async fn test_sha256_file_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.psf");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(sha256_file(&path).await.unwrap(), EMPTY_SHA256);
    }

    #[tokio::test]
    async fn test_sha256_file_known_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        std::fs::write(&path, b"hello\n").unwrap();
        assert_eq!(sha256_file(&path).await.unwrap(), HELLO_SHA256);
    }

    #[tokio::test]
    async fn test_sha256_file_spans_multiple_buffers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("big.dcd");
        let content = vec![7u8; HASH_BUFFER_SIZE * 2 + 13];
        std::fs::write(&path, &content).unwrap();

        let expected = hex::encode(Sha256::digest(&content));
        assert_eq!(sha256_file(&path).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_sha256_file_missing_is_io_error() {
        let temp = TempDir::new().unwrap();
        let result = sha256_file(&temp.path().join("absent")).await;
        assert!(matches!(result, Err(DownloadError::Io { .. })));
    }

    #[test]
    fn test_checksums_match_ignores_case() {
        assert!(checksums_match(EMPTY_SHA256, &EMPTY_SHA256.to_uppercase()));
        assert!(!checksums_match(EMPTY_SHA256, HELLO_SHA256));
    }
}
