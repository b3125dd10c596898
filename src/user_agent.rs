//! User-Agent string for dataset download requests.
//!
//! Content hosts see one stable identifier per crate version.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/MDAnalysis/MDAnalysisData";

/// Default User-Agent for dataset downloads.
#[must_use]
pub(crate) fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("mdanalysis-data/{version} (dataset-fetcher; +{PROJECT_UA_URL})")
}
