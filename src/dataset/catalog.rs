//! Built-in datasets.
//!
//! Each entry fixes the dataset name (its cache directory), the files it
//! consists of and where they come from. Descriptions are compiled in from
//! `descr/<name>.rst`.

use super::bundle::Bundle;
use super::describe::EmbeddedDescriptions;
use super::error::FetchError;
use super::fetcher::{DatasetFetcher, FetchOptions};
use super::metadata::{DatasetSpec, RemoteFileMetadata, Role, SpecEntry};
use crate::download::DownloaderConfig;

/// Name of the AdK equilibrium dataset.
pub const ADK_EQUILIBRIUM: &str = "adk_equilibrium";

/// Name of the I-FABP in water dataset.
pub const IFABP_WATER: &str = "ifabp_water";

struct CatalogFile {
    role: &'static str,
    filename: &'static str,
    url: &'static str,
    checksum: &'static str,
}

/// A dataset shipped with the library.
pub struct CatalogEntry {
    name: &'static str,
    summary: &'static str,
    files: &'static [CatalogFile],
}

impl CatalogEntry {
    /// Dataset name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// One-line summary.
    #[must_use]
    pub fn summary(&self) -> &'static str {
        self.summary
    }

    /// Files of the dataset in fetch order.
    #[must_use]
    pub fn spec(&self) -> DatasetSpec {
        DatasetSpec::from_entries(
            self.files
                .iter()
                .map(|file| {
                    SpecEntry::new(
                        Role::named(file.role),
                        RemoteFileMetadata::from_static(file.filename, file.url, file.checksum),
                        false,
                    )
                })
                .collect(),
        )
    }
}

impl std::fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("name", &self.name)
            .field("files", &self.files.len())
            .finish_non_exhaustive()
    }
}

static ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: ADK_EQUILIBRIUM,
        summary: "AdK 1.004 µs equilibrium trajectory without water (PSF + DCD)",
        files: &[
            CatalogFile {
                role: "topology",
                filename: "adk4AKE.psf",
                url: "https://ndownloader.figshare.com/files/8672230",
                checksum: "1aa947d58fb41b6805dc1e7be4dbe65c6a8f4690f0bd7fc2ae03e7bd437085f4",
            },
            CatalogFile {
                role: "trajectory",
                filename: "1ake_007-nowater-core-dt240ps.dcd",
                url: "https://ndownloader.figshare.com/files/8672074",
                checksum: "598fcbcfcc425f6eafbe9997238320fcacc6a4613ecce061e1521732bab734bf",
            },
        ],
    },
    CatalogEntry {
        name: IFABP_WATER,
        summary: "I-FABP in water, 500 ps trajectory (PSF + PDB + DCD)",
        files: &[
            CatalogFile {
                role: "topology",
                filename: "ifabp_water.psf",
                url: "https://ndownloader.figshare.com/files/12980639",
                checksum: "ba40714318aabec537015dc550fe5bd5ac1ac0b853f5abdd2f0ae63af9cfcafa",
            },
            CatalogFile {
                role: "structure",
                filename: "ifabp_water_0.pdb",
                url: "https://ndownloader.figshare.com/files/12980636",
                checksum: "8ccf5f75fd85385921c0cb77f00281a93b933fc1261c42fc9492f43983448a72",
            },
            CatalogFile {
                role: "trajectory",
                filename: "rmsfit_ifabp_water_1.dcd",
                url: "https://ndownloader.figshare.com/files/12980642",
                checksum: "cebb48e58015abc8ff2f5bb7ba3eb7a289047f256351a8252bf1f29f9aaacf0e",
            },
        ],
    },
];

static DESCRIPTIONS: &[(&str, &str)] = &[
    (ADK_EQUILIBRIUM, include_str!("descr/adk_equilibrium.rst")),
    (IFABP_WATER, include_str!("descr/ifabp_water.rst")),
];

/// Registry of the built-in datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog;

impl Catalog {
    /// All built-in datasets.
    #[must_use]
    pub fn entries() -> &'static [CatalogEntry] {
        ENTRIES
    }

    /// Names of all built-in datasets.
    pub fn names() -> impl Iterator<Item = &'static str> {
        ENTRIES.iter().map(CatalogEntry::name)
    }

    /// Looks up a dataset by name.
    #[must_use]
    pub fn get(name: &str) -> Option<&'static CatalogEntry> {
        ENTRIES.iter().find(|entry| entry.name == name)
    }

    /// Spec of the named dataset.
    #[must_use]
    pub fn spec(name: &str) -> Option<DatasetSpec> {
        Self::get(name).map(CatalogEntry::spec)
    }

    /// Descriptions of the built-in datasets.
    #[must_use]
    pub fn descriptions() -> EmbeddedDescriptions {
        EmbeddedDescriptions::new(DESCRIPTIONS)
    }

    /// Fetches a built-in dataset with `fetcher`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::UnknownDataset`] for names not in the catalog,
    /// otherwise whatever [`DatasetFetcher::fetch`] returns.
    pub async fn fetch(
        fetcher: &DatasetFetcher,
        name: &str,
        options: &FetchOptions,
    ) -> Result<Bundle, FetchError> {
        let entry = Self::get(name).ok_or_else(|| FetchError::UnknownDataset {
            name: name.to_string(),
        })?;
        fetcher
            .fetch(entry.name, &entry.spec(), &Self::descriptions(), options)
            .await
    }
}

async fn fetch_with_defaults(name: &str, options: &FetchOptions) -> Result<Bundle, FetchError> {
    let fetcher = DatasetFetcher::new(DownloaderConfig::default())
        .map_err(|source| FetchError::Setup { source })?;
    Catalog::fetch(&fetcher, name, options).await
}

/// Fetches the AdK equilibrium trajectory (roles: topology, trajectory).
///
/// # Errors
///
/// See [`DatasetFetcher::fetch`].
pub async fn fetch_adk_equilibrium(options: &FetchOptions) -> Result<Bundle, FetchError> {
    fetch_with_defaults(ADK_EQUILIBRIUM, options).await
}

/// Fetches the I-FABP in water trajectory (roles: topology, structure, trajectory).
///
/// # Errors
///
/// See [`DatasetFetcher::fetch`].
pub async fn fetch_ifabp_water(options: &FetchOptions) -> Result<Bundle, FetchError> {
    fetch_with_defaults(IFABP_WATER, options).await
}
