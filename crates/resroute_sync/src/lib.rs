//! # resroute Sync
//!
//! Concurrent local/remote synchronization for resroute.
//!
//! This crate provides:
//! - The [`Http`] network collaborator trait with [`MockHttp`] and
//!   [`FileHttp`] implementations
//! - [`Listing`] summaries and the [`plan`] reconciliation planner
//! - Failure classification ([`ErrorClass`]) into authentication, network
//!   and other failures
//! - [`SyncOrchestrator`], which fetches both sides in parallel and
//!   aggregates outcomes into a [`SyncResult`]
//!
//! ## Architecture
//!
//! A sync pass runs two units concurrently on blocking workers of a private
//! tokio runtime:
//! 1. Remote: `GET {endpoint}{listing_path}` through [`Http`]
//! 2. Local: [`LocalReplica::listing`]
//!
//! The caller blocks until both have finished or the configured timeout
//! elapses. If both succeeded, the planned [`ChangeSet`] is applied through
//! [`LocalReplica::apply`].
//!
//! ## Key Invariants
//!
//! - A pass never returns an error; failures are counted by class
//! - Both units always run to completion before planning
//! - Counters only grow during a pass
//! - The accumulator is the only state shared between units

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod listing;
mod orchestrator;
mod result;
mod transport;

pub use config::{SyncConfig, DEFAULT_LISTING_PATH};
pub use error::{ErrorClass, FetchError, FetchResult, HttpError, SyncError};
pub use listing::{plan, ChangeSet, Entry, Listing};
pub use orchestrator::{LocalReplica, SyncOrchestrator, Syncable};
pub use result::{SyncAccumulator, SyncResult};
pub use transport::{
    FileHttp, Headers, Http, HttpResult, Method, MockHttp, RecordedRequest, API_KEY_HEADER,
};
