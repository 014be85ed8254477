//! Path components and variable markers.

use std::fmt;

/// One level of a route path.
///
/// Variables are written `{name:#}` (numeric) or `{name:*}` (text), where
/// `name` is made of ASCII letters, digits, `_` and `-`. Anything else is a
/// literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathComponent {
    /// Matches the exact text.
    Literal(String),
    /// Matches any component that parses as a base-10 `i64`.
    Numeric(String),
    /// Matches any component that does not parse as an `i64`.
    Text(String),
}

impl PathComponent {
    /// Parses a registered component, recognizing variable markers.
    pub fn parse(component: &str) -> Self {
        let Some(inner) = component
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        else {
            return PathComponent::Literal(component.to_string());
        };

        let Some((name, kind)) = inner.split_once(':') else {
            return PathComponent::Literal(component.to_string());
        };

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return PathComponent::Literal(component.to_string());
        }

        match kind {
            "#" => PathComponent::Numeric(name.to_string()),
            "*" => PathComponent::Text(name.to_string()),
            _ => PathComponent::Literal(component.to_string()),
        }
    }

    /// Returns the variable name, if this is a variable.
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            PathComponent::Literal(_) => None,
            PathComponent::Numeric(name) | PathComponent::Text(name) => Some(name),
        }
    }

    /// Returns true for literal components.
    pub fn is_literal(&self) -> bool {
        matches!(self, PathComponent::Literal(_))
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Literal(text) => write!(f, "{text}"),
            PathComponent::Numeric(name) => write!(f, "{{{name}:#}}"),
            PathComponent::Text(name) => write!(f, "{{{name}:*}}"),
        }
    }
}

/// Splits a path into its non-empty components.
pub(crate) fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_markers() {
        assert_eq!(
            PathComponent::parse("{id:#}"),
            PathComponent::Numeric("id".into())
        );
        assert_eq!(
            PathComponent::parse("{item_name-2:*}"),
            PathComponent::Text("item_name-2".into())
        );
        assert_eq!(
            PathComponent::parse("items"),
            PathComponent::Literal("items".into())
        );
    }

    #[test]
    fn malformed_markers_are_literals() {
        for raw in ["{id}", "{id:?}", "{i d:#}", "{id:#", "id:#}", "{a:b:#}"] {
            assert!(PathComponent::parse(raw).is_literal(), "{raw}");
        }
    }

    #[test]
    fn display_round_trips_markers() {
        for raw in ["{id:#}", "{name:*}", "items"] {
            assert_eq!(PathComponent::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn split_ignores_empty_components() {
        let parts: Vec<_> = split_path("/a//b/").collect();
        assert_eq!(parts, vec!["a", "b"]);
        assert_eq!(split_path("/").count(), 0);
    }
}
