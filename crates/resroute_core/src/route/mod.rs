//! Route tree, registry and matcher.

mod component;
mod tree;

pub use component::PathComponent;
pub use tree::{RouteBuilder, RouteMatch, RouteSegment, RouteTree, SegmentId};

use crate::error::CoreResult;
use crate::selection::Selection;
use crate::types::{ReadRequest, ResourceId, ResultSet};
use crate::value::{Value, Values};
use std::fmt;
use std::sync::Arc;

/// Handles a create request. Receives the merged values.
pub type CreateHandler = Arc<dyn Fn(&Values) -> CoreResult<ResourceId> + Send + Sync>;

/// Handles a read request. Receives the request with its merged selection.
pub type ReadHandler = Arc<dyn Fn(&ReadRequest) -> CoreResult<ResultSet> + Send + Sync>;

/// Handles an update request. Returns the number of updated rows.
pub type UpdateHandler = Arc<dyn Fn(&Values, &Selection) -> CoreResult<u64> + Send + Sync>;

/// Handles a delete request. Returns the number of deleted rows.
pub type DeleteHandler = Arc<dyn Fn(&Selection) -> CoreResult<u64> + Send + Sync>;

/// A CRUD operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create.
    Create,
    /// Read.
    Read,
    /// Update.
    Update,
    /// Delete.
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// The handlers attached to one segment, one slot per operation.
#[derive(Clone, Default)]
pub struct HandlerSlots {
    /// Create handler.
    pub create: Option<CreateHandler>,
    /// Read handler.
    pub read: Option<ReadHandler>,
    /// Update handler.
    pub update: Option<UpdateHandler>,
    /// Delete handler.
    pub delete: Option<DeleteHandler>,
}

impl HandlerSlots {
    /// Returns true if the slot for `operation` is filled.
    pub fn has(&self, operation: Operation) -> bool {
        match operation {
            Operation::Create => self.create.is_some(),
            Operation::Read => self.read.is_some(),
            Operation::Update => self.update.is_some(),
            Operation::Delete => self.delete.is_some(),
        }
    }

    /// Returns the operations this segment handles.
    pub fn operations(&self) -> Vec<Operation> {
        [
            Operation::Create,
            Operation::Read,
            Operation::Update,
            Operation::Delete,
        ]
        .into_iter()
        .filter(|op| self.has(*op))
        .collect()
    }
}

impl fmt::Debug for HandlerSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.operations()).finish()
    }
}

/// Variables captured while matching a path, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables(Vec<(String, Value)>);

impl PathVariables {
    /// Creates an empty capture set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: &str, value: Value) {
        // A name repeated deeper in the path rebinds the variable
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.0.push((name.to_string(), value));
        }
    }

    /// Returns the value captured for `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Iterates captures in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Returns the number of captures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the captures into a value map.
    pub fn to_values(&self) -> Values {
        self.0.iter().cloned().collect()
    }
}
