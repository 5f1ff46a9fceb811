//! imagery-dl command line
//!
//! Loads the catalog, fetches images for every item that lacks one and writes
//! the identifiers nobody could resolve to the failure report.
//!
//! Usage:
//!   imagery-dl --catalog-db catalog.db --imgdir ./images
//!   imagery-dl --config imagery.toml --items items.txt --concurrency 20
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use imagery_dl::inventory::parse_id_lines;
use imagery_dl::{CatalogDb, Config, Error, Identifier, ImageHarvester};

/// Fill gaps in a product image directory from vendor sources
#[derive(Parser, Debug)]
#[command(name = "imagery-dl", version)]
#[command(about = "Fetch missing catalog images and report the ones no source has")]
struct Args {
    /// TOML configuration file
    #[arg(long, short = 'c', env = "IMAGERY_DL_CONFIG")]
    config: Option<PathBuf>,

    /// Image directory (overrides assets.image_dir)
    #[arg(long, env = "IMAGERY_DL_IMAGE_DIR")]
    imgdir: Option<PathBuf>,

    /// SQLite catalog database (overrides catalog.database_path)
    #[arg(long, env = "IMAGERY_DL_CATALOG_DB")]
    catalog_db: Option<PathBuf>,

    /// Plain-text identifier list used instead of the catalog database
    #[arg(long, conflicts_with = "catalog_db")]
    items: Option<PathBuf>,

    /// Exclusion list (overrides assets.exclusion_file)
    #[arg(long)]
    exclusions: Option<PathBuf>,

    /// Failure report path (overrides assets.failure_report)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Number of items resolved concurrently (overrides fetch.concurrency)
    #[arg(long, short = 'j')]
    concurrency: Option<usize>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.imgdir {
            config.assets.image_dir = dir.clone();
        }
        if let Some(path) = &self.catalog_db {
            config.catalog.database_path = Some(path.clone());
        }
        if let Some(path) = &self.exclusions {
            config.assets.exclusion_file = path.clone();
        }
        if let Some(path) = &self.report {
            config.assets.failure_report = path.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.concurrency = concurrency;
        }
    }
}

async fn load_catalog(args: &Args, config: &Config) -> imagery_dl::Result<HashSet<Identifier>> {
    if let Some(path) = &args.items {
        let content = tokio::fs::read_to_string(path).await?;
        return Ok(parse_id_lines(&content));
    }

    let Some(path) = &config.catalog.database_path else {
        return Err(Error::config(
            "catalog.database_path",
            "no catalog given: pass --catalog-db, --items, or set catalog.database_path",
        ));
    };
    let db = CatalogDb::open(path, &config.catalog).await?;
    let ids = db.catalog_item_ids().await;
    db.close().await;
    ids
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);

    let harvester = ImageHarvester::new(config)?;
    let catalog = load_catalog(&args, harvester.config()).await?;
    let summary = harvester.run_with_shutdown(catalog).await?;

    println!(
        "{} catalog items, {} already had images, {} excluded",
        summary.catalog_items, summary.existing_assets, summary.excluded
    );
    println!(
        "{} fetched, {} unresolved (see {})",
        summary.resolved,
        summary.unresolved.len(),
        harvester.config().assets.failure_report.display()
    );
    if summary.skipped > 0 {
        println!("{} skipped after shutdown request", summary.skipped);
    }

    Ok(())
}
