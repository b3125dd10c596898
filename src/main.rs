//! CLI entry point for the mdanalysis-data tool.

use anyhow::{Context, Result, bail};
use clap::Parser;
use mdanalysis_data::{
    Bundle, Catalog, DatasetFetcher, DescriptionStore, clear_data_home, resolve_data_home,
};
use tracing::debug;

mod cli;

use cli::{Cli, Command, FetchArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    init_tracing(cli.log_level());
    debug!(?cli, "CLI arguments parsed");

    match &cli.command {
        Command::List => list(),
        Command::Fetch(args) => fetch(&cli, args).await?,
        Command::Describe { name } => describe(name)?,
        Command::Clear { data_home } => {
            let root = resolve_data_home(data_home.as_deref())?;
            if clear_data_home(Some(root.as_path()))? {
                println!("removed {}", root.display());
            } else {
                println!("nothing to remove at {}", root.display());
            }
        }
    }

    Ok(())
}

/// Priority: `RUST_LOG` > `-q` > `-v` count > info. Logs go to stderr.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn list() {
    for entry in Catalog::entries() {
        println!("{}\t{}", entry.name(), entry.summary());
        for (role, metadata) in entry.spec().iter() {
            println!("    {role}: {}", metadata.filename());
        }
    }
}

async fn fetch(cli: &Cli, args: &FetchArgs) -> Result<()> {
    let fetcher = DatasetFetcher::new(cli.downloader_config())?;
    let bundle = Catalog::fetch(&fetcher, &args.name, &args.fetch_options())
        .await
        .with_context(|| format!("failed to fetch dataset '{}'", args.name))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else {
        print_bundle(&bundle);
    }
    Ok(())
}

fn print_bundle(bundle: &Bundle) {
    for file in bundle.files() {
        println!("{}\t{}", file.role, file.path.display());
    }
}

fn describe(name: &str) -> Result<()> {
    if Catalog::get(name).is_none() {
        let known: Vec<&str> = Catalog::names().collect();
        bail!("unknown dataset '{name}' (available: {})", known.join(", "));
    }
    let text = Catalog::descriptions().describe(name)?;
    print!("{text}");
    Ok(())
}
