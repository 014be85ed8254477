//! Resource dispatcher.
//!
//! Translates generic CRUD calls into route resolution, selection merging
//! and handler invocation.

use crate::error::{CoreError, CoreResult};
use crate::route::{HandlerSlots, Operation, PathVariables, RouteTree};
use crate::selection::{Selection, SelectionBuilder};
use crate::types::{ReadRequest, ResourceId, ResultSet};
use crate::value::Values;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Dispatches CRUD requests to the handlers of an installed route tree.
///
/// The dispatcher starts with no tree installed; every request fails with
/// [`CoreError::NotStarted`] until [`install`](Self::install) is called.
///
/// # Selection merging
///
/// For read, update and delete, each captured path variable is appended to
/// the caller's selection as an equality clause, in path order. For create,
/// captured variables are added to the caller's values; a value supplied by
/// the caller wins over a path variable with the same name.
#[derive(Debug, Default)]
pub struct Dispatcher {
    routes: RwLock<Option<Arc<RouteTree>>>,
}

impl Dispatcher {
    /// Creates a dispatcher with no route tree installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a route tree, replacing any previous one.
    pub fn install(&self, tree: RouteTree) {
        debug!(segments = tree.len(), "installing route tree");
        *self.routes.write() = Some(Arc::new(tree));
    }

    /// Removes the installed route tree.
    pub fn uninstall(&self) {
        debug!("uninstalling route tree");
        *self.routes.write() = None;
    }

    /// Returns true if a route tree is installed.
    pub fn is_started(&self) -> bool {
        self.routes.read().is_some()
    }

    fn tree(&self) -> CoreResult<Arc<RouteTree>> {
        self.routes.read().clone().ok_or(CoreError::NotStarted)
    }

    /// Finds the route for `path` and picks the handler for `operation`.
    fn resolve<'a, T>(
        tree: &'a RouteTree,
        path: &str,
        operation: Operation,
        slot: impl FnOnce(&'a HandlerSlots) -> Option<&'a T>,
    ) -> CoreResult<(&'a T, PathVariables)> {
        debug!(%operation, path, "dispatching");

        let found = tree.find(path).ok_or_else(|| CoreError::NoRouteFound {
            path: path.to_string(),
        })?;

        let handler = slot(found.segment.handlers()).ok_or_else(|| CoreError::NoHandlerFound {
            path: path.to_string(),
            operation,
        })?;

        Ok((handler, found.variables))
    }

    fn merge_selection(selection: &Selection, variables: &PathVariables) -> Selection {
        if variables.is_empty() {
            return selection.clone();
        }

        let mut builder = SelectionBuilder::from_selection(selection);
        for (name, value) in variables.iter() {
            builder.push(name, value.clone());
        }
        builder.build()
    }

    /// Invokes the create handler at `path`.
    ///
    /// The handler receives `values` plus the captured path variables;
    /// caller-supplied values take precedence on a name collision.
    pub fn create(&self, path: &str, values: Values) -> CoreResult<ResourceId> {
        let tree = self.tree()?;
        let (handler, variables) =
            Self::resolve(&tree, path, Operation::Create, |h| h.create.as_ref())?;

        let mut merged = variables.to_values();
        merged.extend(values);
        handler(&merged)
    }

    /// Invokes the read handler at `path` with the merged selection.
    pub fn read(&self, path: &str, request: ReadRequest) -> CoreResult<ResultSet> {
        let tree = self.tree()?;
        let (handler, variables) =
            Self::resolve(&tree, path, Operation::Read, |h| h.read.as_ref())?;

        let request = ReadRequest {
            selection: Self::merge_selection(&request.selection, &variables),
            ..request
        };
        handler(&request)
    }

    /// Like [`read`](Self::read), returning only the first row.
    pub fn read_single(&self, path: &str, request: ReadRequest) -> CoreResult<Option<Values>> {
        Ok(self.read(path, request)?.into_iter().next())
    }

    /// Invokes the update handler at `path` with the merged selection.
    ///
    /// `values` are passed through unchanged.
    pub fn update(&self, path: &str, selection: Selection, values: Values) -> CoreResult<u64> {
        let tree = self.tree()?;
        let (handler, variables) =
            Self::resolve(&tree, path, Operation::Update, |h| h.update.as_ref())?;
        let selection = Self::merge_selection(&selection, &variables);
        handler(&values, &selection)
    }

    /// Invokes the delete handler at `path` with the merged selection.
    pub fn delete(&self, path: &str, selection: Selection) -> CoreResult<u64> {
        let tree = self.tree()?;
        let (handler, variables) =
            Self::resolve(&tree, path, Operation::Delete, |h| h.delete.as_ref())?;
        let selection = Self::merge_selection(&selection, &variables);
        handler(&selection)
    }
}
