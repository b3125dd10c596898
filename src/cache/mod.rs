//! Data home resolution and per-dataset cache directories.
//!
//! Every dataset lives in its own directory under the data home:
//!
//! ```text
//! <data_home>/<dataset_name>/<filename>
//! ```
//!
//! The data home is chosen, in priority order, from:
//! 1. An explicit override passed by the caller
//! 2. The `MDANALYSIS_DATA` environment variable
//! 3. `$HOME/MDAnalysis_data`
//!
//! A leading `~` in the override or environment value expands to `$HOME`.
//! Nothing here is cached in process-global state; callers thread the
//! resolved path through every fetch.

mod error;

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

pub use error::CacheError;

/// Environment variable that overrides the default data home.
pub const DATA_HOME_ENV: &str = "MDANALYSIS_DATA";

/// Directory name of the default data home under `$HOME`.
pub const DEFAULT_DATA_HOME_DIR: &str = "MDAnalysis_data";

/// Maximum characters accepted in a dataset name.
const MAX_DATASET_NAME_CHARS: usize = 128;

/// Resolves the data home directory without creating it.
///
/// # Errors
///
/// Returns [`CacheError::HomeUnavailable`] when no override is given,
/// `MDANALYSIS_DATA` is unset and `HOME` is unavailable.
pub fn resolve_data_home(data_home: Option<&Path>) -> Result<PathBuf, CacheError> {
    resolve_data_home_from(
        data_home,
        sanitize_env_path(env::var_os(DATA_HOME_ENV)),
        sanitize_env_path(env::var_os("HOME")),
    )
}

fn sanitize_env_path(value: Option<OsString>) -> Option<PathBuf> {
    let value = value?;
    if value.to_string_lossy().trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}

fn resolve_data_home_from(
    data_home: Option<&Path>,
    env_data_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, CacheError> {
    let configured = data_home.map(Path::to_path_buf).or(env_data_home);
    match configured {
        Some(path) => expand_tilde(&path, home.as_deref()),
        None => home
            .map(|home| home.join(DEFAULT_DATA_HOME_DIR))
            .ok_or(CacheError::HomeUnavailable),
    }
}

/// Expands a leading `~` component to the home directory.
fn expand_tilde(path: &Path, home: Option<&Path>) -> Result<PathBuf, CacheError> {
    let mut components = path.components();
    let starts_with_tilde = components
        .next()
        .is_some_and(|first| first.as_os_str() == "~");
    if !starts_with_tilde {
        return Ok(path.to_path_buf());
    }

    let home = home.ok_or(CacheError::HomeUnavailable)?;
    Ok(home.join(components.as_path()))
}

/// Creates `<root>/<name>` (and `root` itself) if missing, returning the dataset directory.
///
/// Idempotent: an existing directory is not an error.
///
/// # Errors
///
/// - [`CacheError::InvalidDatasetName`] if `name` is not a single safe path segment
/// - [`CacheError::NotADirectory`] if a file occupies the target path
/// - [`CacheError::Io`] if creation fails (permissions, read-only media)
#[instrument(level = "debug", skip(root), fields(root = %root.display()))]
pub fn ensure_dataset_dir(root: &Path, name: &str) -> Result<PathBuf, CacheError> {
    validate_dataset_name(name)?;
    let dataset_dir = root.join(name);

    for dir in [root, dataset_dir.as_path()] {
        if dir.exists() && !dir.is_dir() {
            return Err(CacheError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }
    }

    if !dataset_dir.is_dir() {
        fs::create_dir_all(&dataset_dir).map_err(|e| CacheError::io(&dataset_dir, e))?;
        debug!(path = %dataset_dir.display(), "created dataset directory");
    }

    Ok(dataset_dir)
}

/// Rejects names that would escape or nest inside the data home.
pub(crate) fn validate_dataset_name(name: &str) -> Result<(), CacheError> {
    if name.trim().is_empty() {
        return Err(CacheError::invalid_name(name, "name is empty"));
    }
    if name == "." || name == ".." {
        return Err(CacheError::invalid_name(name, "path traversal"));
    }
    if name.contains(['/', '\\']) {
        return Err(CacheError::invalid_name(name, "contains a path separator"));
    }
    if name.chars().any(char::is_control) {
        return Err(CacheError::invalid_name(name, "contains control characters"));
    }
    if name.chars().count() > MAX_DATASET_NAME_CHARS {
        return Err(CacheError::invalid_name(name, "name is too long"));
    }
    Ok(())
}

/// Deletes the whole data home tree.
///
/// Returns `false` when there was nothing to delete.
///
/// # Errors
///
/// Returns [`CacheError`] if the data home cannot be resolved, is not a
/// directory, or removal fails.
#[instrument(level = "debug")]
pub fn clear_data_home(data_home: Option<&Path>) -> Result<bool, CacheError> {
    let root = resolve_data_home(data_home)?;
    if !root.exists() {
        debug!(path = %root.display(), "data home does not exist, nothing to clear");
        return Ok(false);
    }
    if !root.is_dir() {
        return Err(CacheError::NotADirectory { path: root });
    }

    fs::remove_dir_all(&root).map_err(|e| CacheError::io(&root, e))?;
    info!(path = %root.display(), "cleared data home");
    Ok(true)
}
