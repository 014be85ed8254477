//! resroute CLI
//!
//! Command-line driver for a resroute catalog.
//!
//! # Commands
//!
//! - `sync` - Refresh the local catalog from the remote listing
//! - `read` - Read every resource at a path
//! - `get` - Read the first resource at a path
//! - `delete` - Delete the resources at a path
//!
//! The remote is a fixture directory served by [`FileHttp`]; paths that do
//! not start with `/` are taken relative to the catalog root.

mod commands;

use clap::{Parser, Subcommand};
use resroute_catalog::{Catalog, CatalogConfig};
use resroute_sync::{FileHttp, SyncConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Routed, synchronized catalog tools.
#[derive(Parser)]
#[command(name = "resroute")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the catalog snapshot (in memory if omitted)
    #[arg(global = true, short, long)]
    database: Option<PathBuf>,

    /// Directory of JSON fixtures serving as the remote
    #[arg(global = true, short, long, default_value = ".")]
    fixtures: PathBuf,

    /// Remote endpoint the listing path is appended to
    #[arg(global = true, short, long, default_value = "https://localhost")]
    endpoint: String,

    /// Path of the listing document under the endpoint
    #[arg(global = true, long, default_value = resroute_sync::DEFAULT_LISTING_PATH)]
    listing_path: String,

    /// Sync timeout in seconds
    #[arg(global = true, long, default_value = "30")]
    timeout: u64,

    /// First component of every catalog path
    #[arg(global = true, short, long, default_value = "catalog")]
    root: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the local catalog from the remote listing
    Sync {
        /// Rewrite entries even if the remote version is unchanged
        #[arg(long)]
        force: bool,
    },

    /// Read every resource at a path
    Read {
        /// Resource path, e.g. items/Ahri/children
        path: String,

        /// Sort clause, e.g. "name DESC"
        #[arg(short, long)]
        sort: Option<String>,

        /// Comma-separated columns to return
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Read the first resource at a path
    Get {
        /// Resource path, e.g. items/103
        path: String,
    },

    /// Delete the resources at a path
    Delete {
        /// Resource path, e.g. items/Ahri
        path: String,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn catalog(&self) -> Result<Catalog<FileHttp>, Box<dyn std::error::Error>> {
        let sync = SyncConfig::new(&self.endpoint)
            .with_listing_path(&self.listing_path)
            .with_timeout(Duration::from_secs(self.timeout));
        let mut config = CatalogConfig::new(sync).with_root(&self.root);
        if let Some(dir) = &self.database {
            config = config.with_database_dir(dir);
        }

        let catalog = Catalog::new(config, Arc::new(FileHttp::new(&self.fixtures)))?;
        catalog.start()?;
        Ok(catalog)
    }
}

fn resolve(catalog: &Catalog<FileHttp>, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        catalog.path(path)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Sync { force } => {
            let catalog = cli.catalog()?;
            commands::sync::run(&catalog, *force)?;
        }
        Commands::Read {
            path,
            sort,
            columns,
        } => {
            let catalog = cli.catalog()?;
            let path = resolve(&catalog, path);
            commands::read::run(&catalog, &path, sort.as_deref(), columns)?;
        }
        Commands::Get { path } => {
            let catalog = cli.catalog()?;
            let path = resolve(&catalog, path);
            commands::read::run_single(&catalog, &path)?;
        }
        Commands::Delete { path } => {
            let catalog = cli.catalog()?;
            let path = resolve(&catalog, path);
            commands::delete::run(&catalog, &path)?;
        }
        Commands::Version => {
            println!("resroute CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("resroute Core v{}", resroute_core::VERSION);
        }
    }

    Ok(())
}
