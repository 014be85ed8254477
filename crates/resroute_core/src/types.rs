//! Request and result types shared by routes and the dispatcher.

use crate::selection::{Selection, SelectionArgs};
use crate::value::Values;

/// Identifier returned by create handlers.
pub type ResourceId = i64;

/// Rows returned by read handlers.
pub type ResultSet = Vec<Values>;

/// Parameters of a read request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadRequest {
    /// Columns to return (all when `None`).
    pub projection: Option<Vec<String>>,
    /// Filter predicate and its arguments.
    pub selection: Selection,
    /// Grouping clause.
    pub grouping: Option<String>,
    /// Having clause.
    pub having: Option<String>,
    /// Sort clause, e.g. `name DESC`.
    pub sort: Option<String>,
}

impl ReadRequest {
    /// Creates an unfiltered read request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the projection.
    #[must_use]
    pub fn with_projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the raw predicate and its arguments.
    #[must_use]
    pub fn with_selection(mut self, predicate: impl Into<String>, args: SelectionArgs) -> Self {
        self.selection = Selection {
            predicate: Some(predicate.into()),
            args,
        };
        self
    }

    /// Sets the grouping clause.
    #[must_use]
    pub fn with_grouping(mut self, grouping: impl Into<String>) -> Self {
        self.grouping = Some(grouping.into());
        self
    }

    /// Sets the having clause.
    #[must_use]
    pub fn with_having(mut self, having: impl Into<String>) -> Self {
        self.having = Some(having.into());
        self
    }

    /// Sets the sort clause.
    #[must_use]
    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}
