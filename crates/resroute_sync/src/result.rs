//! Outcome counters of a sync pass.

use crate::error::ErrorClass;
use crate::listing::ChangeSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Counters describing one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Entries planned for insertion.
    pub inserts: u64,
    /// Entries planned for update.
    pub updates: u64,
    /// Entries planned for deletion.
    pub deletes: u64,
    /// Authentication failures.
    pub authentication_errors: u64,
    /// Network failures.
    pub network_errors: u64,
    /// Any other failures.
    pub other_errors: u64,
    /// Passes that gave up waiting for their units.
    pub timeouts: u64,
}

impl SyncResult {
    /// Returns the total number of failures, timeouts included.
    pub fn error_count(&self) -> u64 {
        self.authentication_errors + self.network_errors + self.other_errors + self.timeouts
    }

    /// Returns true if anything went wrong.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Returns the number of planned changes.
    pub fn change_count(&self) -> u64 {
        self.inserts + self.updates + self.deletes
    }
}

/// A [`SyncResult`] shared by the concurrent units of one pass.
#[derive(Debug, Default)]
pub struct SyncAccumulator {
    inner: Mutex<SyncResult>,
}

impl SyncAccumulator {
    /// Creates a zeroed accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one failure of `class`.
    pub fn record_error(&self, class: ErrorClass) {
        let mut result = self.inner.lock();
        match class {
            ErrorClass::Authentication => result.authentication_errors += 1,
            ErrorClass::Network => result.network_errors += 1,
            ErrorClass::Other => result.other_errors += 1,
        }
    }

    /// Counts one timeout.
    pub fn record_timeout(&self) {
        self.inner.lock().timeouts += 1;
    }

    /// Adds the planned counts of `changes`.
    pub fn record_plan(&self, changes: &ChangeSet) {
        let mut result = self.inner.lock();
        result.inserts += changes.inserts.len() as u64;
        result.updates += changes.updates.len() as u64;
        result.deletes += changes.deletes.len() as u64;
    }

    /// Returns a copy of the current counters.
    pub fn snapshot(&self) -> SyncResult {
        *self.inner.lock()
    }
}
