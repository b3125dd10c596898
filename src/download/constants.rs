//! Constants for the download module (timeouts, retry caps, temp files).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large trajectories).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Maximum Retry-After header value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Suffix of in-flight download files.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Read buffer size when hashing files already on disk.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;
