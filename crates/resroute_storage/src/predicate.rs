//! Evaluation of conjunctive equality predicates.
//!
//! The store understands the predicates produced by
//! [`SelectionBuilder`](resroute_core::SelectionBuilder): zero or more
//! `(column=?)` / `(column=:name)` clauses joined by `AND`, where each
//! clause may also be written without parentheses.

use crate::error::{StorageError, StorageResult};
use resroute_core::{Selection, SelectionArgs, Value, Values};

/// A compiled predicate: column/value pairs that must all be equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    terms: Vec<(String, Value)>,
}

impl Filter {
    /// Compiles a selection, binding placeholders to their arguments.
    pub fn compile(selection: &Selection) -> StorageResult<Self> {
        let Some(predicate) = selection.predicate.as_deref() else {
            return Ok(Self::default());
        };

        let mut terms = Vec::new();
        let mut next_positional = 0usize;

        for raw in predicate.split(" AND ") {
            let clause = strip_parens(raw.trim());
            let (column, placeholder) = clause
                .split_once('=')
                .ok_or_else(|| StorageError::InvalidPredicate(raw.trim().to_string()))?;
            let column = column.trim();
            let placeholder = placeholder.trim();

            // Same alphabet as route variable names
            if column.is_empty()
                || !column
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(StorageError::InvalidPredicate(raw.trim().to_string()));
            }

            let value = match placeholder {
                "?" => {
                    let value = match &selection.args {
                        SelectionArgs::Positional(values) => values.get(next_positional),
                        SelectionArgs::Named(_) => None,
                    };
                    next_positional += 1;
                    value.cloned().ok_or_else(|| {
                        StorageError::MissingParameter(format!("?{}", next_positional - 1))
                    })?
                }
                named if named.starts_with(':') => {
                    let name = &named[1..];
                    let value = match &selection.args {
                        SelectionArgs::Named(values) => values.get(name),
                        SelectionArgs::Positional(_) => None,
                    };
                    value
                        .cloned()
                        .ok_or_else(|| StorageError::MissingParameter(named.to_string()))?
                }
                _ => return Err(StorageError::InvalidPredicate(raw.trim().to_string())),
            };

            terms.push((column.to_string(), value));
        }

        Ok(Self { terms })
    }

    /// Returns true if `row` satisfies every term. Missing columns are null.
    pub fn matches(&self, row: &Values) -> bool {
        self.terms
            .iter()
            .all(|(column, expected)| row.get(column).unwrap_or(&Value::Null) == expected)
    }

    /// Returns true if the filter accepts every row.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

fn strip_parens(mut clause: &str) -> &str {
    while let Some(inner) = clause
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        clause = inner.trim();
    }
    clause
}
