//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mdanalysis_data::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use mdanalysis_data::{DEFAULT_MAX_RETRIES, DownloaderConfig, FetchOptions, RetryPolicy, VerifyPolicy};

/// Fetch and cache MDAnalysis example datasets.
///
/// Files are stored under the data home (`--data-home`, `MDANALYSIS_DATA`, or
/// `~/MDAnalysis_data`) and verified against their SHA-256 checksums.
#[derive(Parser, Debug)]
#[command(name = "mdanalysis-data")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Maximum download attempts per file, including the first (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(1..=10), global = true)]
    pub max_retries: u8,

    /// Connect timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = CONNECT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..), global = true)]
    pub connect_timeout: u64,

    /// Read timeout in seconds (maximum idle time between chunks)
    #[arg(long, value_name = "SECS", default_value_t = READ_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..), global = true)]
    pub read_timeout: u64,

    /// How cached files are trusted
    #[arg(long, value_enum, default_value_t = VerifyMode::Checksum, global = true)]
    pub verify: VerifyMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in datasets and their files
    #[command(alias = "ls")]
    List,

    /// Fetch a dataset into the cache and print its file paths
    Fetch(FetchArgs),

    /// Print a dataset's description
    Describe {
        /// Dataset name
        name: String,
    },

    /// Delete the whole data home
    Clear {
        /// Data home to clear instead of the default
        #[arg(long, value_name = "PATH")]
        data_home: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Dataset name (see `list`)
    pub name: String,

    /// Cache root instead of MDANALYSIS_DATA or ~/MDAnalysis_data
    #[arg(long, value_name = "PATH")]
    pub data_home: Option<PathBuf>,

    /// Never download; fail if a file is missing or corrupt
    #[arg(long, conflicts_with = "force")]
    pub offline: bool,

    /// Re-download every file even if cached
    #[arg(long)]
    pub force: bool,

    /// Print the bundle as JSON
    #[arg(long)]
    pub json: bool,
}

impl FetchArgs {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            data_home: self.data_home.clone(),
            download_if_missing: !self.offline,
            force: self.force,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyMode {
    /// Re-hash cached files before use
    Checksum,
    /// Trust any cached file that exists
    Existence,
}

impl From<VerifyMode> for VerifyPolicy {
    fn from(mode: VerifyMode) -> Self {
        match mode {
            VerifyMode::Checksum => Self::Checksum,
            VerifyMode::Existence => Self::ExistenceOnly,
        }
    }
}

impl Cli {
    /// Default log level when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    pub fn downloader_config(&self) -> DownloaderConfig {
        DownloaderConfig::default()
            .with_timeouts(
                Duration::from_secs(self.connect_timeout),
                Duration::from_secs(self.read_timeout),
            )
            .with_retry_policy(RetryPolicy::with_max_attempts(u32::from(self.max_retries)))
            .with_verify(self.verify.into())
    }
}
