//! Remote file descriptors, dataset roles and dataset specs.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LEN: usize = 64;

/// Errors raised while building dataset definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// The same role was declared twice in one dataset.
    #[error("duplicate role '{role}' in dataset spec")]
    DuplicateRole {
        /// The repeated role.
        role: Role,
    },

    /// Two roles would be cached under the same filename.
    #[error("duplicate filename '{filename}' in dataset spec")]
    DuplicateFilename {
        /// The repeated filename.
        filename: String,
    },

    /// Filename is not a single plain path component.
    #[error("invalid filename '{filename}': {reason}")]
    InvalidFilename {
        /// The rejected filename.
        filename: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Checksum is not a hex SHA-256 digest.
    #[error("invalid SHA-256 checksum '{checksum}': expected 64 hex characters")]
    InvalidChecksum {
        /// The rejected checksum.
        checksum: String,
    },
}

/// Immutable descriptor of one remote file: where it lives and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFileMetadata {
    filename: String,
    url: String,
    checksum: String,
}

impl RemoteFileMetadata {
    /// Creates a descriptor, validating the filename and checksum.
    ///
    /// The checksum is stored lowercase. The URL is validated when fetched.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidFilename`] or [`SpecError::InvalidChecksum`].
    pub fn new(
        filename: impl Into<String>,
        url: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Result<Self, SpecError> {
        let filename = filename.into();
        validate_filename(&filename)?;
        let checksum = normalize_checksum(&checksum.into())?;
        Ok(Self {
            filename,
            url: url.into(),
            checksum,
        })
    }

    /// Static catalog entries; validated by the catalog tests.
    pub(crate) fn from_static(filename: &str, url: &str, checksum: &str) -> Self {
        Self {
            filename: filename.to_string(),
            url: url.to_string(),
            checksum: checksum.to_string(),
        }
    }

    /// Name of the file inside the dataset's cache directory.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Expected lowercase hex SHA-256 digest.
    #[must_use]
    pub fn checksum(&self) -> &str {
        &self.checksum
    }
}

pub(crate) fn validate_filename(filename: &str) -> Result<(), SpecError> {
    let reject = |reason| {
        Err(SpecError::InvalidFilename {
            filename: filename.to_string(),
            reason,
        })
    };
    if filename.trim().is_empty() {
        return reject("filename is empty");
    }
    if filename == "." || filename == ".." {
        return reject("path traversal");
    }
    if filename.contains(['/', '\\']) {
        return reject("contains a path separator");
    }
    if filename.chars().any(char::is_control) {
        return reject("contains control characters");
    }
    Ok(())
}

pub(crate) fn normalize_checksum(checksum: &str) -> Result<String, SpecError> {
    let trimmed = checksum.trim();
    if trimmed.len() != SHA256_HEX_LEN || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SpecError::InvalidChecksum {
            checksum: checksum.to_string(),
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Logical purpose of one file within a dataset.
///
/// Equality, ordering and hashing follow [`Role::as_str`], so
/// `Role::Named("topology".into())` equals [`Role::Topology`].
#[derive(Debug, Clone)]
pub enum Role {
    /// Topology (e.g. CHARMM PSF).
    Topology,
    /// Trajectory (e.g. DCD).
    Trajectory,
    /// Single-frame structure (e.g. PDB).
    Structure,
    /// Any other role a dataset declares.
    Named(Cow<'static, str>),
}

impl Role {
    /// Builds a role from its name, mapping well-known names to their variants.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        match name.as_ref() {
            "topology" => Self::Topology,
            "trajectory" => Self::Trajectory,
            "structure" => Self::Structure,
            _ => Self::Named(name),
        }
    }

    /// Lowercase role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Topology => "topology",
            Self::Trajectory => "trajectory",
            Self::Structure => "structure",
            Self::Named(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::named(s.trim().to_ascii_lowercase()))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One declared file of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecEntry {
    role: Role,
    metadata: RemoteFileMetadata,
    optional: bool,
}

impl SpecEntry {
    pub(crate) fn new(role: Role, metadata: RemoteFileMetadata, optional: bool) -> Self {
        Self {
            role,
            metadata,
            optional,
        }
    }

    /// Role the file plays.
    #[must_use]
    pub fn role(&self) -> &Role {
        &self.role
    }

    /// Where to fetch it from.
    #[must_use]
    pub fn metadata(&self) -> &RemoteFileMetadata {
        &self.metadata
    }

    /// Whether the bundle may omit it when it is unavailable offline.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }
}

/// Ordered role → file mapping describing one dataset.
///
/// Roles and filenames are unique. Iteration follows declaration order,
/// which is also the order files are checked and downloaded in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSpec {
    entries: Vec<SpecEntry>,
}

impl DatasetSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a spec from entries already known to be unique.
    pub(crate) fn from_entries(entries: Vec<SpecEntry>) -> Self {
        Self { entries }
    }

    /// Adds a required file.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::DuplicateRole`] or [`SpecError::DuplicateFilename`].
    pub fn with_file(mut self, role: Role, metadata: RemoteFileMetadata) -> Result<Self, SpecError> {
        self.insert(role, metadata, false)?;
        Ok(self)
    }

    /// Adds a file the bundle may omit when downloads are disabled and it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::DuplicateRole`] or [`SpecError::DuplicateFilename`].
    pub fn with_optional_file(
        mut self,
        role: Role,
        metadata: RemoteFileMetadata,
    ) -> Result<Self, SpecError> {
        self.insert(role, metadata, true)?;
        Ok(self)
    }

    /// Appends an entry, rejecting duplicate roles and filenames.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::DuplicateRole`] or [`SpecError::DuplicateFilename`].
    pub fn insert(
        &mut self,
        role: Role,
        metadata: RemoteFileMetadata,
        optional: bool,
    ) -> Result<(), SpecError> {
        if self.get(&role).is_some() {
            return Err(SpecError::DuplicateRole { role });
        }
        if self
            .entries
            .iter()
            .any(|entry| entry.metadata.filename == metadata.filename)
        {
            return Err(SpecError::DuplicateFilename {
                filename: metadata.filename,
            });
        }
        self.entries.push(SpecEntry::new(role, metadata, optional));
        Ok(())
    }

    /// Looks up the file declared for `role`.
    #[must_use]
    pub fn get(&self, role: &Role) -> Option<&RemoteFileMetadata> {
        self.entries
            .iter()
            .find(|entry| &entry.role == role)
            .map(|entry| &entry.metadata)
    }

    /// Entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[SpecEntry] {
        &self.entries
    }

    /// `(role, metadata)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Role, &RemoteFileMetadata)> {
        self.entries.iter().map(|entry| (&entry.role, &entry.metadata))
    }

    /// Number of declared files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
