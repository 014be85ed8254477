//! Error types for storage operations.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// The lifecycle stage a schema hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// `on_configure`.
    Configure,
    /// `on_create`.
    Create,
    /// `on_upgrade`.
    Upgrade,
    /// `on_downgrade`.
    Downgrade,
    /// `on_open`.
    Open,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookStage::Configure => "configure",
            HookStage::Create => "create",
            HookStage::Upgrade => "upgrade",
            HookStage::Downgrade => "downgrade",
            HookStage::Open => "open",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The snapshot file could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The table does not exist.
    #[error("no such table: {0}")]
    NoSuchTable(String),

    /// The table already exists.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// A row violates a table constraint.
    #[error("constraint violation on {table}: {message}")]
    Constraint {
        /// The table.
        table: String,
        /// What was violated.
        message: String,
    },

    /// The predicate is not a conjunction of equality clauses.
    #[error("invalid predicate: {0}")]
    InvalidPredicate(String),

    /// A placeholder has no bound value.
    #[error("missing parameter: {0}")]
    MissingParameter(String),

    /// The query uses a feature the store does not provide.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A schema hook failed while preparing the database.
    #[error("database initialization failed during {stage}: {source}")]
    Initialization {
        /// The failing stage.
        stage: HookStage,
        /// The hook's error.
        #[source]
        source: Box<StorageError>,
    },
}
