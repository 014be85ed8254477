//! Delete command implementation.

use resroute_catalog::Catalog;
use resroute_core::Selection;
use resroute_sync::FileHttp;

/// Deletes the resources at `path` and prints how many were removed.
pub fn run(catalog: &Catalog<FileHttp>, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let deleted = catalog.delete(path, Selection::none())?;
    println!("{}", serde_json::json!({ "deleted": deleted }));
    Ok(())
}
