//! # resroute Catalog
//!
//! A routed, synchronized item catalog built from the resroute crates.
//!
//! The catalog keeps items (and each item's children) in a local
//! [`resroute_storage`] store, exposes them through resource paths dispatched
//! by [`resroute_core`], and refreshes them from a remote listing with
//! [`resroute_sync`].
//!
//! ## Routes
//!
//! ```text
//! /catalog/items                                        read
//! /catalog/items/sync                                   create {force}
//! /catalog/items/{name:*}                               read, update, delete
//! /catalog/items/{item_id:#}                            read, update, delete
//! /catalog/items/{name|item_id}/children                read
//! /catalog/items/{name|item_id}/children/{child_id:#}   read
//! ```
//!
//! ## Example
//!
//! ```rust
//! use resroute_catalog::{Catalog, CatalogConfig};
//! use resroute_core::{ReadRequest, Values};
//! use resroute_sync::{MockHttp, SyncConfig};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let http = MockHttp::new();
//! http.respond(
//!     "https://data.example.com/listing.json",
//!     Ok(json!({"version": "1", "data": {"Ahri": {"key": "103", "title": "the Nine-Tailed Fox"}}})),
//! );
//!
//! let config = CatalogConfig::new(SyncConfig::new("https://data.example.com"));
//! let catalog = Catalog::new(config, Arc::new(http)).unwrap();
//! catalog.start().unwrap();
//!
//! assert_eq!(catalog.create("/catalog/items/sync", Values::new()).unwrap(), 1);
//! let ahri = catalog.read_single("/catalog/items/103", ReadRequest::new()).unwrap();
//! assert!(ahri.is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod config;
mod error;
mod replica;
mod routes;
mod schema;

pub use catalog::Catalog;
pub use config::{CatalogConfig, DATABASE_FILE};
pub use error::{CatalogError, CatalogResult};
pub use replica::{json_to_value, CatalogReplica};
pub use schema::{
    CatalogSchema, CHILDREN_TABLE, COLUMN_BLURB, COLUMN_CHILD_ID, COLUMN_FINGERPRINT,
    COLUMN_ITEM_ID, COLUMN_KEY, COLUMN_NAME, COLUMN_NUMBER, COLUMN_TITLE, COLUMN_TYPE,
    COLUMN_VERSION, ITEMS_TABLE, LISTING_VERSION_TYPE, VERSION_TABLE,
};
