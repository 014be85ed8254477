//! Configuration for a catalog.

use resroute_sync::SyncConfig;
use std::path::{Path, PathBuf};

/// File name of the catalog snapshot inside the database directory.
pub const DATABASE_FILE: &str = "catalog.json";

/// Configuration for a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// First path component of every catalog route.
    pub root: String,
    /// Directory holding the snapshot file; in memory when `None`.
    pub database_dir: Option<PathBuf>,
    /// Expected schema version.
    pub schema_version: u32,
    /// Sync settings.
    pub sync: SyncConfig,
}

impl CatalogConfig {
    /// Creates a configuration syncing from `sync`.
    pub fn new(sync: SyncConfig) -> Self {
        Self {
            root: "catalog".to_string(),
            database_dir: None,
            schema_version: 1,
            sync,
        }
    }

    /// Sets the route root. Surrounding slashes are ignored.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into().trim_matches('/').to_string();
        self
    }

    /// Stores the snapshot under `dir`.
    pub fn with_database_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.database_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Sets the expected schema version.
    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    /// Returns the snapshot path, if file-backed.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_dir.as_ref().map(|dir| dir.join(DATABASE_FILE))
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(SyncConfig::default())
    }
}
