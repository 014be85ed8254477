//! Selection (filter predicate) building.
//!
//! A selection is the equivalent of a query's `WHERE` clause: a predicate
//! string with placeholders plus the values bound to them. Predicates can
//! use parameter markers (`col=?`) or named parameters (`col=:value0`).

use crate::value::Value;
use std::collections::BTreeMap;

/// How generated clauses refer to their bound values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `?` markers bound by position.
    #[default]
    Positional,
    /// `:valueN` markers bound by name.
    Named,
}

/// Values bound to a predicate's placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionArgs {
    /// Values in marker order.
    Positional(Vec<Value>),
    /// Values by placeholder name (without the leading `:`).
    Named(BTreeMap<String, Value>),
}

impl SelectionArgs {
    /// Returns the placeholder style these arguments bind.
    pub fn style(&self) -> PlaceholderStyle {
        match self {
            SelectionArgs::Positional(_) => PlaceholderStyle::Positional,
            SelectionArgs::Named(_) => PlaceholderStyle::Named,
        }
    }

    /// Returns the number of bound values.
    pub fn len(&self) -> usize {
        match self {
            SelectionArgs::Positional(values) => values.len(),
            SelectionArgs::Named(values) => values.len(),
        }
    }

    /// Returns true if no values are bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SelectionArgs {
    fn default() -> Self {
        SelectionArgs::Positional(Vec::new())
    }
}

/// A predicate and the values bound to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// The predicate, `None` meaning "no filter".
    pub predicate: Option<String>,
    /// Bound values.
    pub args: SelectionArgs,
}

impl Selection {
    /// Creates an empty selection (no predicate, no arguments).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a selection from a predicate and its arguments.
    #[must_use]
    pub fn new(predicate: impl Into<String>, args: SelectionArgs) -> Self {
        Self {
            predicate: Some(predicate.into()),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum ParamKey {
    Ordinal(usize),
    Name(String),
}

/// Builds a conjunctive equality predicate.
///
/// Clauses are joined with `AND` in the order they were added. Each builder
/// hands out parameter keys that are unique within the builder: ordinals
/// `0..N` in positional style, `value0, value1, ...` in named style.
///
/// # Example
///
/// ```rust
/// use resroute_core::{SelectionBuilder, Value};
///
/// let builder = SelectionBuilder::positional()
///     .with("name", Value::from("Ahri"))
///     .with("title", None)
///     .with("item_id", Value::from(103i64));
///
/// assert_eq!(
///     builder.build_predicate().as_deref(),
///     Some("(name=?) AND (item_id=?)")
/// );
/// assert_eq!(
///     builder.build_args_list(),
///     Some(vec![Value::from("Ahri"), Value::from(103i64)])
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct SelectionBuilder {
    style: PlaceholderStyle,
    clauses: Vec<String>,
    params: BTreeMap<ParamKey, Value>,
}

impl SelectionBuilder {
    /// Creates an empty builder with the given placeholder style.
    #[must_use]
    pub fn new(style: PlaceholderStyle) -> Self {
        Self {
            style,
            clauses: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    /// Creates an empty builder using `?` markers.
    #[must_use]
    pub fn positional() -> Self {
        Self::new(PlaceholderStyle::Positional)
    }

    /// Creates an empty builder using `:valueN` markers.
    #[must_use]
    pub fn named() -> Self {
        Self::new(PlaceholderStyle::Named)
    }

    /// Creates a builder seeded with an external clause and arguments.
    ///
    /// Positional arguments take ordinals `0..n`; named arguments keep
    /// their names. Further [`with`](Self::with) calls append after them.
    #[must_use]
    pub fn seeded(style: PlaceholderStyle, clause: Option<&str>, args: &SelectionArgs) -> Self {
        let mut builder = Self::new(style);

        if let Some(clause) = clause.map(str::trim).filter(|c| !c.is_empty()) {
            builder.clauses.push(clause.to_string());
        }

        match args {
            SelectionArgs::Positional(values) => {
                for (ordinal, value) in values.iter().enumerate() {
                    builder
                        .params
                        .insert(ParamKey::Ordinal(ordinal), value.clone());
                }
            }
            SelectionArgs::Named(values) => {
                for (name, value) in values {
                    builder
                        .params
                        .insert(ParamKey::Name(name.clone()), value.clone());
                }
            }
        }

        builder
    }

    /// Creates a builder seeded from an existing selection, in its style.
    #[must_use]
    pub fn from_selection(selection: &Selection) -> Self {
        Self::seeded(
            selection.args.style(),
            selection.predicate.as_deref(),
            &selection.args,
        )
    }

    /// Returns the placeholder style.
    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Returns the number of clauses.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Appends `(expression=<placeholder>)` bound to `value`.
    ///
    /// Does nothing when `value` is `None`.
    #[must_use]
    pub fn with(mut self, expression: &str, value: impl Into<Option<Value>>) -> Self {
        self.push(expression, value);
        self
    }

    /// In-place form of [`with`](Self::with).
    pub fn push(&mut self, expression: &str, value: impl Into<Option<Value>>) -> &mut Self {
        let Some(value) = value.into() else {
            return self;
        };

        let placeholder = self.bind(value);
        self.clauses.push(format!("({expression}={placeholder})"));
        self
    }

    fn bind(&mut self, value: Value) -> String {
        match self.style {
            PlaceholderStyle::Positional => {
                let ordinal = self.next_ordinal();
                self.params.insert(ParamKey::Ordinal(ordinal), value);
                "?".to_string()
            }
            PlaceholderStyle::Named => {
                let mut n = self.params.len();
                let mut name = format!("value{n}");
                while self.params.contains_key(&ParamKey::Name(name.clone())) {
                    n += 1;
                    name = format!("value{n}");
                }
                self.params.insert(ParamKey::Name(name.clone()), value);
                format!(":{name}")
            }
        }
    }

    fn next_ordinal(&self) -> usize {
        self.params
            .keys()
            .filter_map(|key| match key {
                ParamKey::Ordinal(n) => Some(n + 1),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Joins all clauses with `AND`, or `None` when there are no clauses.
    pub fn build_predicate(&self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(self.clauses.join(" AND "))
        }
    }

    /// Returns values ordered by ascending ordinal (positional style only).
    pub fn build_args_list(&self) -> Option<Vec<Value>> {
        if self.style != PlaceholderStyle::Positional {
            return None;
        }

        // BTreeMap iterates ordinals in ascending order
        Some(
            self.params
                .iter()
                .filter(|(key, _)| matches!(key, ParamKey::Ordinal(_)))
                .map(|(_, value)| value.clone())
                .collect(),
        )
    }

    /// Returns values by placeholder name (named style only).
    pub fn build_args_map(&self) -> Option<BTreeMap<String, Value>> {
        if self.style != PlaceholderStyle::Named {
            return None;
        }

        Some(
            self.params
                .iter()
                .filter_map(|(key, value)| match key {
                    ParamKey::Name(name) => Some((name.clone(), value.clone())),
                    ParamKey::Ordinal(_) => None,
                })
                .collect(),
        )
    }

    /// Builds the selection in this builder's style.
    pub fn build(&self) -> Selection {
        let args = match self.style {
            PlaceholderStyle::Positional => {
                SelectionArgs::Positional(self.build_args_list().unwrap_or_default())
            }
            PlaceholderStyle::Named => {
                SelectionArgs::Named(self.build_args_map().unwrap_or_default())
            }
        };

        Selection {
            predicate: self.build_predicate(),
            args,
        }
    }
}
