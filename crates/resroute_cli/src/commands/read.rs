//! Read and get command implementations.

use resroute_catalog::Catalog;
use resroute_core::ReadRequest;
use resroute_sync::FileHttp;

/// Reads every resource at `path` and prints the rows as JSON.
pub fn run(
    catalog: &Catalog<FileHttp>,
    path: &str,
    sort: Option<&str>,
    columns: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = ReadRequest::new();
    if let Some(sort) = sort {
        request = request.with_sort(sort);
    }
    if !columns.is_empty() {
        request = request.with_projection(columns.iter().map(String::as_str));
    }

    let rows = catalog.read(path, request)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

/// Reads the first resource at `path` and prints it, or `null`.
pub fn run_single(catalog: &Catalog<FileHttp>, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let row = catalog.read_single(path, ReadRequest::new())?;
    println!("{}", serde_json::to_string_pretty(&row)?);
    Ok(())
}
