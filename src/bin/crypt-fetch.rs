//! crypt-fetch CLI - install the MongoDB crypt_shared library
//!
//! Usage:
//!   crypt-fetch                        Install into ./vendor/crypt_shared
//!   crypt-fetch --dest path/to/app     Install into a project root
//!   crypt-fetch --cache-dir /var/tmp   Keep archive + catalog caches elsewhere

use anyhow::Result;
use clap::Parser;
use crypt_fetch::listing::{self, Listing};
use crypt_fetch::platform::Platform;
use crypt_fetch::{Acquirer, Outcome, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crypt-fetch")]
#[command(about = "Fetch the MongoDB crypt_shared encryption library for this host")]
#[command(version)]
struct Cli {
    /// Project root; the library lands in <dest>/vendor/crypt_shared
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// Catalog endpoint to query
    #[arg(long, env = "CRYPT_FETCH_CATALOG_URL", default_value = listing::CURRENT_URL)]
    catalog_url: String,

    /// Directory for the downloaded-archive and catalog caches
    /// (defaults to the system temp directory)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Named sub-artifact to install from the matching download
    #[arg(long, default_value = crypt_fetch::acquire::DEFAULT_ARTIFACT)]
    artifact: String,
}

fn main() {
    if let Err(err) = run() {
        output::error_line(&format!("{err:#}"));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let platform = Platform::detect()?;
    let cache_dir = cli.cache_dir.unwrap_or_else(std::env::temp_dir);
    let listing = Listing::new(
        cli.catalog_url,
        cache_dir.join(listing::CACHE_FILE_NAME),
    );

    let acquirer = Acquirer::new(&cli.dest, platform)
        .with_listing(listing)
        .with_cache_dir(cache_dir)
        .with_artifact(cli.artifact);

    match acquirer.run()? {
        Outcome::Installed(_) => Ok(()),
        Outcome::NoBuildForHost => {
            // Not a pipeline failure: the catalog simply has nothing for
            // this host yet.
            output::warning("cannot find a crypt_shared download for this host; skipping");
            Ok(())
        }
    }
}
