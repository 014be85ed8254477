//! # resroute Core
//!
//! In-process resource routing for resroute.
//!
//! This crate provides:
//! - A closed [`Value`] type for rows, values and selection arguments
//! - A hierarchical route tree with typed path variables
//! - A selection (filter predicate) builder with positional or named placeholders
//! - A [`Dispatcher`] translating generic CRUD calls into handler invocations
//!
//! ## Addressing
//!
//! Resources are addressed by slash-delimited paths such as
//! `/catalog/items/42/children`. Paths are in-process addresses, not URLs.
//! A path level is either a literal, a numeric variable (`{id:#}`) or a text
//! variable (`{name:*}`).
//!
//! ## Key Invariants
//!
//! - An exact literal always wins over a variable at the same level
//! - Numeric variables only match integer-parseable components
//! - Text variables only match components that are not integers
//! - A failed match never exposes partial captures
//! - The route tree is immutable once built and safe to share across threads
//!
//! ## Example
//!
//! ```rust
//! use resroute_core::{Dispatcher, ReadRequest, RouteBuilder, Value, Values};
//!
//! let mut builder = RouteBuilder::new();
//! let items = builder.add_segment("/shop/items", None);
//! let by_id = builder.add_segment(&RouteBuilder::numeric_variable("id"), Some(items));
//! builder.on_read(by_id, |request: &ReadRequest| {
//!     let mut row = Values::new();
//!     row.insert("where".into(), Value::from(request.selection.predicate.clone()));
//!     Ok(vec![row])
//! });
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher.install(builder.build());
//!
//! let rows = dispatcher.read("/shop/items/7", ReadRequest::new()).unwrap();
//! assert_eq!(rows[0]["where"], Value::from("(id=?)"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dispatcher;
mod error;
mod route;
mod selection;
mod types;
mod value;

pub use dispatcher::Dispatcher;
pub use error::{CoreError, CoreResult};
pub use route::{
    CreateHandler, DeleteHandler, HandlerSlots, Operation, PathComponent, PathVariables,
    ReadHandler, RouteBuilder, RouteMatch, RouteSegment, RouteTree, SegmentId, UpdateHandler,
};
pub use selection::{PlaceholderStyle, Selection, SelectionArgs, SelectionBuilder};
pub use types::{ReadRequest, ResourceId, ResultSet};
pub use value::{Value, Values};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
