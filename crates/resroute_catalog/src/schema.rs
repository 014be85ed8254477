//! Catalog tables and their lifecycle hooks.

use resroute_core::ReadRequest;
use resroute_storage::{SchemaHooks, StorageResult, TableSpec, Transaction};
use tracing::{debug, info};

/// Table holding version tags, keyed by `type`.
pub const VERSION_TABLE: &str = "catalog_version";
/// Table holding items.
pub const ITEMS_TABLE: &str = "items";
/// Table holding the children of items.
pub const CHILDREN_TABLE: &str = "children";

/// `type` column of the version table.
pub const COLUMN_TYPE: &str = "type";
/// `version` column of the version table.
pub const COLUMN_VERSION: &str = "version";
/// Numeric item id.
pub const COLUMN_ITEM_ID: &str = "item_id";
/// Item name; also stored on children.
pub const COLUMN_NAME: &str = "name";
/// Item or child title.
pub const COLUMN_TITLE: &str = "title";
/// Item description.
pub const COLUMN_BLURB: &str = "blurb";
/// Listing key of an item.
pub const COLUMN_KEY: &str = "key";
/// Fingerprint of the entry an item was written from.
pub const COLUMN_FINGERPRINT: &str = "fingerprint";
/// Numeric child id.
pub const COLUMN_CHILD_ID: &str = "child_id";
/// Position of a child within its item.
pub const COLUMN_NUMBER: &str = "number";

/// Version type recorded for the remote listing.
pub const LISTING_VERSION_TYPE: &str = "listing";

const TABLES: [&str; 3] = [VERSION_TABLE, ITEMS_TABLE, CHILDREN_TABLE];

/// Schema hooks for the catalog store.
///
/// The catalog is a cache of remote data, so schema changes in either
/// direction rebuild the tables and let the next sync refill them.
#[derive(Debug, Default, Clone, Copy)]
pub struct CatalogSchema;

impl CatalogSchema {
    fn create_tables(tx: &mut Transaction) -> StorageResult<()> {
        debug!(table = VERSION_TABLE, "creating catalog table");
        tx.create_table(
            VERSION_TABLE,
            TableSpec::new([COLUMN_TYPE, COLUMN_VERSION]).with_primary_key([COLUMN_TYPE]),
        )?;

        debug!(table = ITEMS_TABLE, "creating catalog table");
        tx.create_table(
            ITEMS_TABLE,
            TableSpec::new([
                COLUMN_ITEM_ID,
                COLUMN_NAME,
                COLUMN_TITLE,
                COLUMN_BLURB,
                COLUMN_KEY,
                COLUMN_FINGERPRINT,
            ])
            .with_primary_key([COLUMN_ITEM_ID]),
        )?;

        debug!(table = CHILDREN_TABLE, "creating catalog table");
        tx.create_table(
            CHILDREN_TABLE,
            TableSpec::new([
                COLUMN_CHILD_ID,
                COLUMN_ITEM_ID,
                COLUMN_NAME,
                COLUMN_NUMBER,
                COLUMN_TITLE,
            ])
            .with_primary_key([COLUMN_CHILD_ID]),
        )
    }

    fn rebuild(tx: &mut Transaction) -> StorageResult<()> {
        for table in TABLES {
            if tx.has_table(table) {
                tx.drop_table(table)?;
            }
        }
        Self::create_tables(tx)
    }
}

impl SchemaHooks for CatalogSchema {
    fn on_create(&self, tx: &mut Transaction) -> StorageResult<()> {
        Self::create_tables(tx)
    }

    fn on_upgrade(&self, tx: &mut Transaction, from: u32, to: u32) -> StorageResult<()> {
        info!(from, to, "rebuilding catalog tables for newer schema");
        Self::rebuild(tx)
    }

    fn on_downgrade(&self, tx: &mut Transaction, from: u32, to: u32) -> StorageResult<()> {
        info!(from, to, "rebuilding catalog tables for older schema");
        Self::rebuild(tx)
    }

    fn on_open(&self, tx: &mut Transaction) -> StorageResult<()> {
        let items = tx.select(ITEMS_TABLE, &ReadRequest::new())?.len();
        debug!(items, "catalog opened");
        Ok(())
    }
}
