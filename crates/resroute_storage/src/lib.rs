//! # resroute Storage
//!
//! Transactional, schema-versioned table store for resroute.
//!
//! This crate provides the local cache that route handlers read from and
//! sync passes write to:
//!
//! - [`Database`] - Named tables of [`Values`](resroute_core::Values) rows
//!   plus a schema version, in memory or backed by a JSON snapshot file
//! - [`Transaction`] - An all-or-nothing unit of work over a database
//! - [`Filter`] - Evaluation of the predicates built by
//!   [`SelectionBuilder`](resroute_core::SelectionBuilder)
//! - [`SchemaHooks`] and [`OpenHelper`] - Lazy opening with create, upgrade,
//!   downgrade and open callbacks
//!
//! ## Design Principles
//!
//! - Every write happens inside a transaction; a failed closure leaves the
//!   store untouched
//! - Only conjunctive equality predicates are understood; anything else is
//!   rejected rather than guessed at
//! - Must be `Send + Sync` so handlers on any thread can share one database
//!
//! ## Example
//!
//! ```rust
//! use resroute_storage::{OpenHelper, SchemaHooks, StorageResult, TableSpec, Transaction};
//!
//! struct Schema;
//!
//! impl SchemaHooks for Schema {
//!     fn on_create(&self, tx: &mut Transaction) -> StorageResult<()> {
//!         tx.create_table("notes", TableSpec::new(["id", "text"]).with_primary_key(["id"]))
//!     }
//! }
//!
//! let helper = OpenHelper::in_memory(Schema, 1);
//! let db = helper.database().unwrap();
//! assert_eq!(db.user_version(), 1);
//! assert_eq!(db.table_names(), vec!["notes".to_string()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod database;
mod error;
mod helper;
mod predicate;

pub use database::{Database, TableSpec, Transaction};
pub use error::{HookStage, StorageError, StorageResult};
pub use helper::{Location, OpenHelper, SchemaHooks};
pub use predicate::Filter;
