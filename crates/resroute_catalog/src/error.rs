//! Error types for the catalog.

use thiserror::Error;

/// Result type for catalog construction.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that can occur while setting up a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The sync orchestrator could not be created.
    #[error("sync error: {0}")]
    Sync(#[from] resroute_sync::SyncError),

    /// The store could not be opened.
    #[error("storage error: {0}")]
    Storage(#[from] resroute_storage::StorageError),
}
