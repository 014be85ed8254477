//! The catalog repository.

use crate::config::CatalogConfig;
use crate::error::CatalogResult;
use crate::replica::CatalogReplica;
use crate::routes::build_routes;
use crate::schema::CatalogSchema;
use resroute_core::{CoreResult, Dispatcher, ReadRequest, ResourceId, ResultSet, Selection, Values};
use resroute_storage::{Database, OpenHelper, StorageResult};
use resroute_sync::{Http, SyncOrchestrator, SyncResult, Syncable};
use std::sync::Arc;
use tracing::info;

/// A routed, synchronized catalog of items and their children.
///
/// Reads and writes go through resource paths such as
/// `/catalog/items/Ahri/children`; [`start`](Self::start) installs the
/// route table and [`stop`](Self::stop) removes it. Creating
/// `/catalog/items/sync` (or calling [`Syncable::sync`]) refreshes the local
/// store from the remote listing.
pub struct Catalog<H> {
    config: CatalogConfig,
    store: Arc<OpenHelper<CatalogSchema>>,
    orchestrator: Arc<SyncOrchestrator<H, CatalogReplica>>,
    dispatcher: Dispatcher,
}

impl<H: Http + 'static> Catalog<H> {
    /// Creates a stopped catalog that syncs through `http`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync runtime cannot be built.
    pub fn new(config: CatalogConfig, http: Arc<H>) -> CatalogResult<Self> {
        let store = Arc::new(match config.database_path() {
            Some(path) => OpenHelper::file(path, CatalogSchema, config.schema_version),
            None => OpenHelper::in_memory(CatalogSchema, config.schema_version),
        });
        let replica = Arc::new(CatalogReplica::new(Arc::clone(&store)));
        let orchestrator = Arc::new(SyncOrchestrator::new(config.sync.clone(), http, replica)?);

        Ok(Self {
            config,
            store,
            orchestrator,
            dispatcher: Dispatcher::new(),
        })
    }

    /// Opens the store and installs the route table.
    ///
    /// Starting an already started catalog rebuilds its routes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or prepared.
    pub fn start(&self) -> CatalogResult<()> {
        self.store.database()?;
        let syncer: Arc<dyn Syncable + Send + Sync> = self.orchestrator.clone();
        self.dispatcher
            .install(build_routes(&self.config.root, &self.store, syncer));
        info!(root = %self.config.root, "catalog started");
        Ok(())
    }

    /// Removes the route table. Requests fail until the next `start`.
    pub fn stop(&self) {
        self.dispatcher.uninstall();
        info!(root = %self.config.root, "catalog stopped");
    }

    /// Returns true between `start` and `stop`.
    pub fn is_started(&self) -> bool {
        self.dispatcher.is_started()
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Returns the absolute resource path of `relative` under the root.
    pub fn path(&self, relative: &str) -> String {
        format!("/{}/{}", self.config.root, relative.trim_start_matches('/'))
    }

    /// Returns the underlying database, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or prepared.
    pub fn database(&self) -> StorageResult<Arc<Database>> {
        self.store.database()
    }

    /// Creates a resource at `path`.
    pub fn create(&self, path: &str, values: Values) -> CoreResult<ResourceId> {
        self.dispatcher.create(path, values)
    }

    /// Reads the resources at `path`.
    pub fn read(&self, path: &str, request: ReadRequest) -> CoreResult<ResultSet> {
        self.dispatcher.read(path, request)
    }

    /// Reads the first resource at `path`.
    pub fn read_single(&self, path: &str, request: ReadRequest) -> CoreResult<Option<Values>> {
        self.dispatcher.read_single(path, request)
    }

    /// Updates the resources at `path`.
    pub fn update(&self, path: &str, selection: Selection, values: Values) -> CoreResult<u64> {
        self.dispatcher.update(path, selection, values)
    }

    /// Deletes the resources at `path`.
    pub fn delete(&self, path: &str, selection: Selection) -> CoreResult<u64> {
        self.dispatcher.delete(path, selection)
    }
}

impl<H: Http + 'static> Syncable for Catalog<H> {
    fn sync(&self, force: bool) -> SyncResult {
        self.orchestrator.sync(force)
    }
}

impl<H> std::fmt::Debug for Catalog<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("config", &self.config)
            .field("started", &self.dispatcher.is_started())
            .finish_non_exhaustive()
    }
}
