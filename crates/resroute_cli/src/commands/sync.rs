//! Sync command implementation.

use resroute_catalog::Catalog;
use resroute_sync::{FileHttp, Syncable};

/// Runs one sync pass and prints its counters as JSON.
pub fn run(catalog: &Catalog<FileHttp>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = catalog.sync(force);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.has_errors() {
        return Err(format!("sync finished with {} error(s)", result.error_count()).into());
    }
    Ok(())
}
