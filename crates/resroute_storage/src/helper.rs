//! Schema lifecycle hooks and lazy database opening.
//!
//! An [`OpenHelper`] owns the location of a database, the schema version the
//! application expects, and a [`SchemaHooks`] implementation. The first call
//! to [`OpenHelper::database`] opens the store and brings its schema to the
//! expected version inside a single transaction:
//!
//! 1. `on_configure`
//! 2. `on_create` when the stored version is 0, otherwise `on_upgrade` or
//!    `on_downgrade` when the stored version differs from the expected one
//! 3. `on_open`
//!
//! If any hook fails, the transaction is rolled back, nothing is cached, and
//! the error is reported as [`StorageError::Initialization`]. The next call
//! to `database()` tries again.

use crate::database::{Database, Transaction};
use crate::error::{HookStage, StorageError, StorageResult};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Callbacks that prepare a database schema.
///
/// Every hook runs inside the opening transaction.
pub trait SchemaHooks: Send + Sync {
    /// Runs first on every open.
    fn on_configure(&self, _tx: &mut Transaction) -> StorageResult<()> {
        Ok(())
    }

    /// Creates the schema of a fresh database.
    fn on_create(&self, tx: &mut Transaction) -> StorageResult<()>;

    /// Migrates a schema from an older version.
    fn on_upgrade(&self, _tx: &mut Transaction, _from: u32, _to: u32) -> StorageResult<()> {
        Ok(())
    }

    /// Migrates a schema from a newer version.
    fn on_downgrade(&self, _tx: &mut Transaction, _from: u32, _to: u32) -> StorageResult<()> {
        Ok(())
    }

    /// Runs last on every open.
    fn on_open(&self, _tx: &mut Transaction) -> StorageResult<()> {
        Ok(())
    }
}

fn stage_error(stage: HookStage) -> impl FnOnce(StorageError) -> StorageError {
    move |source| StorageError::Initialization {
        stage,
        source: Box::new(source),
    }
}

/// Where an [`OpenHelper`] keeps its database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A fresh in-memory store per open.
    Memory,
    /// A JSON snapshot file.
    File(PathBuf),
}

/// Lazily opens a database and runs its schema hooks once.
pub struct OpenHelper<H> {
    location: Location,
    version: u32,
    hooks: H,
    cached: Mutex<Option<Arc<Database>>>,
}

impl<H: SchemaHooks> OpenHelper<H> {
    /// Creates a helper for an in-memory database.
    pub fn in_memory(hooks: H, version: u32) -> Self {
        Self::new(Location::Memory, hooks, version)
    }

    /// Creates a helper for a file-backed database.
    pub fn file(path: impl AsRef<Path>, hooks: H, version: u32) -> Self {
        Self::new(Location::File(path.as_ref().to_path_buf()), hooks, version)
    }

    /// Creates a helper for `location`, expecting schema `version`.
    pub fn new(location: Location, hooks: H, version: u32) -> Self {
        Self {
            location,
            version,
            hooks,
            cached: Mutex::new(None),
        }
    }

    /// Returns the expected schema version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Returns the database, opening and preparing it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened, the expected version
    /// is 0, or a hook fails.
    pub fn database(&self) -> StorageResult<Arc<Database>> {
        let mut cached = self.cached.lock();
        if let Some(db) = cached.as_ref() {
            return Ok(Arc::clone(db));
        }

        if self.version == 0 {
            return Err(StorageError::Unsupported("schema version 0".into()));
        }

        let db = match &self.location {
            Location::Memory => Database::in_memory(),
            Location::File(path) => Database::open(path)?,
        };
        db.transaction(|tx| self.prepare(tx))?;

        let db = Arc::new(db);
        *cached = Some(Arc::clone(&db));
        Ok(db)
    }

    /// Drops the cached handle. The next `database()` call reopens.
    pub fn close(&self) {
        if self.cached.lock().take().is_some() {
            debug!("database closed");
        }
    }

    /// Returns true if a database is currently cached.
    pub fn is_open(&self) -> bool {
        self.cached.lock().is_some()
    }

    fn prepare(&self, tx: &mut Transaction) -> StorageResult<()> {
        let current = tx.user_version();
        let target = self.version;

        debug!(stage = %HookStage::Configure, "running schema hook");
        self.hooks
            .on_configure(tx)
            .map_err(stage_error(HookStage::Configure))?;

        if current == 0 {
            debug!(stage = %HookStage::Create, "running schema hook");
            self.hooks
                .on_create(tx)
                .map_err(stage_error(HookStage::Create))?;
        } else if current < target {
            info!(from = current, to = target, "upgrading schema");
            self.hooks
                .on_upgrade(tx, current, target)
                .map_err(stage_error(HookStage::Upgrade))?;
        } else if current > target {
            info!(from = current, to = target, "downgrading schema");
            self.hooks
                .on_downgrade(tx, current, target)
                .map_err(stage_error(HookStage::Downgrade))?;
        }

        if current != target {
            tx.set_user_version(target);
        }

        debug!(stage = %HookStage::Open, "running schema hook");
        self.hooks
            .on_open(tx)
            .map_err(stage_error(HookStage::Open))
    }
}

impl<H> std::fmt::Debug for OpenHelper<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenHelper")
            .field("location", &self.location)
            .field("version", &self.version)
            .field("open", &self.cached.lock().is_some())
            .finish_non_exhaustive()
    }
}
