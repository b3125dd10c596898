//! Datasets: what they contain, how they are fetched and what a fetch returns.
//!
//! - [`DatasetSpec`] lists the files of a dataset by [`Role`]
//! - [`DatasetFetcher`] resolves the cache, downloads what is missing and
//!   builds a [`Bundle`]
//! - [`Catalog`] holds the built-in datasets

mod bundle;
mod catalog;
mod describe;
mod error;
mod fetcher;
mod metadata;

pub use bundle::{Bundle, BundleFile};
pub use catalog::{
    ADK_EQUILIBRIUM, Catalog, CatalogEntry, IFABP_WATER, fetch_adk_equilibrium, fetch_ifabp_water,
};
pub use describe::{DescriptionStore, DirectoryDescriptions, EmbeddedDescriptions};
pub use error::FetchError;
pub use fetcher::{DatasetFetcher, FetchOptions};
pub use metadata::{DatasetSpec, RemoteFileMetadata, Role, SpecEntry, SpecError};
