//! The result of a successful dataset fetch.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::FetchError;
use super::metadata::Role;

/// One local file in a [`Bundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleFile {
    /// Role the file plays.
    pub role: Role,
    /// Absolute or data-home-relative path of the verified file.
    pub path: PathBuf,
}

/// Role → local path mapping plus a human-readable description.
///
/// Every path points at a file that was present (and verified, under the
/// active policy) when the bundle was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    dataset: String,
    files: Vec<BundleFile>,
    description: String,
}

impl Bundle {
    pub(crate) fn new(dataset: impl Into<String>, files: Vec<BundleFile>, description: String) -> Self {
        Self {
            dataset: dataset.into(),
            files,
            description,
        }
    }

    /// Dataset name.
    #[must_use]
    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Human-readable description of the dataset.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Local path of the file for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownRole`] if the bundle has no such role.
    pub fn path(&self, role: &Role) -> Result<&Path, FetchError> {
        self.files
            .iter()
            .find(|file| &file.role == role)
            .map(|file| file.path.as_path())
            .ok_or_else(|| FetchError::UnknownRole {
                dataset: self.dataset.clone(),
                role: role.clone(),
            })
    }

    /// Shorthand for `path(&Role::Topology)`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownRole`] if the dataset has no topology.
    pub fn topology(&self) -> Result<&Path, FetchError> {
        self.path(&Role::Topology)
    }

    /// Shorthand for `path(&Role::Trajectory)`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownRole`] if the dataset has no trajectory.
    pub fn trajectory(&self) -> Result<&Path, FetchError> {
        self.path(&Role::Trajectory)
    }

    /// Shorthand for `path(&Role::Structure)`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownRole`] if the dataset has no structure.
    pub fn structure(&self) -> Result<&Path, FetchError> {
        self.path(&Role::Structure)
    }

    /// Whether the bundle holds a file for `role`.
    #[must_use]
    pub fn contains(&self, role: &Role) -> bool {
        self.files.iter().any(|file| &file.role == role)
    }

    /// Files in the order they were declared.
    #[must_use]
    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    /// Roles present in the bundle.
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.files.iter().map(|file| &file.role)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Bundle {
        Bundle::new(
            "sample",
            vec![
                BundleFile {
                    role: Role::Topology,
                    path: PathBuf::from("/data/sample/top.psf"),
                },
                BundleFile {
                    role: Role::Trajectory,
                    path: PathBuf::from("/data/sample/traj.dcd"),
                },
            ],
            "Sample dataset".to_string(),
        )
    }

    #[test]
    fn test_bundle_lookup_by_role() {
        let bundle = sample();
        assert_eq!(bundle.topology().unwrap(), Path::new("/data/sample/top.psf"));
        assert_eq!(
            bundle.path(&Role::named("trajectory")).unwrap(),
            Path::new("/data/sample/traj.dcd")
        );
        assert!(bundle.contains(&Role::Topology));
        assert_eq!(bundle.description(), "Sample dataset");
        assert_eq!(bundle.dataset(), "sample");
    }

    #[test]
    fn test_bundle_unknown_role() {
        let bundle = sample();
        match bundle.structure() {
            Err(FetchError::UnknownRole { dataset, role }) => {
                assert_eq!(dataset, "sample");
                assert_eq!(role, Role::Structure);
            }
            other => panic!("expected UnknownRole, got {other:?}"),
        }
    }

    #[test]
    fn test_bundle_serializes_in_declaration_order() {
        let bundle = sample();
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["dataset"], "sample");
        assert_eq!(json["files"][0]["role"], "topology");
        assert_eq!(json["files"][1]["path"], "/data/sample/traj.dcd");
        let roles: Vec<&str> = bundle.roles().map(Role::as_str).collect();
        assert_eq!(roles, vec!["topology", "trajectory"]);
    }
}
