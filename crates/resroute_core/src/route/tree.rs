//! Arena-backed route tree.

use super::component::{split_path, PathComponent};
use super::{HandlerSlots, PathVariables};
use crate::error::CoreResult;
use crate::selection::Selection;
use crate::types::{ReadRequest, ResourceId, ResultSet};
use crate::value::{Value, Values};
use std::sync::Arc;

/// Index of a segment inside a route tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentId(usize);

/// One level of the route tree.
#[derive(Debug, Clone)]
pub struct RouteSegment {
    component: PathComponent,
    handlers: HandlerSlots,
    children: Vec<SegmentId>,
}

impl RouteSegment {
    fn new(component: PathComponent) -> Self {
        Self {
            component,
            handlers: HandlerSlots::default(),
            children: Vec::new(),
        }
    }

    /// Returns the path component this segment matches.
    pub fn component(&self) -> &PathComponent {
        &self.component
    }

    /// Returns the segment's handler slots.
    pub fn handlers(&self) -> &HandlerSlots {
        &self.handlers
    }

    /// Returns the ids of child segments, in registration order.
    pub fn children(&self) -> &[SegmentId] {
        &self.children
    }
}

/// Declarative builder for a [`RouteTree`].
///
/// Segments are created (or reused) per path level; the returned
/// [`SegmentId`] is used to attach handlers or register children.
#[derive(Debug, Default)]
pub struct RouteBuilder {
    segments: Vec<RouteSegment>,
    roots: Vec<SegmentId>,
}

impl RouteBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the marker for a text variable named `name`.
    pub fn text_variable(name: &str) -> String {
        PathComponent::Text(name.to_string()).to_string()
    }

    /// Returns the marker for a numeric variable named `name`.
    pub fn numeric_variable(name: &str) -> String {
        PathComponent::Numeric(name.to_string()).to_string()
    }

    /// Registers `path` under `parent` (the root level when `None`).
    ///
    /// Each component creates a segment, or reuses a sibling registered
    /// with the identical component. Returns the deepest segment. An empty
    /// path returns `parent` itself, or a fresh empty-literal root segment
    /// when there is no parent.
    pub fn add_segment(&mut self, path: &str, parent: Option<SegmentId>) -> SegmentId {
        let mut current = parent;

        for raw in split_path(path) {
            current = Some(self.child(current, PathComponent::parse(raw)));
        }

        match current {
            Some(id) => id,
            None => self.child(None, PathComponent::Literal(String::new())),
        }
    }

    fn child(&mut self, parent: Option<SegmentId>, component: PathComponent) -> SegmentId {
        let siblings = match parent {
            Some(id) => &self.segments[id.0].children,
            None => &self.roots,
        };

        if let Some(existing) = siblings
            .iter()
            .copied()
            .find(|id| self.segments[id.0].component == component)
        {
            return existing;
        }

        let id = SegmentId(self.segments.len());
        self.segments.push(RouteSegment::new(component));
        match parent {
            Some(parent) => self.segments[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Attaches a create handler, replacing any previous one.
    pub fn on_create<F>(&mut self, segment: SegmentId, handler: F) -> &mut Self
    where
        F: Fn(&Values) -> CoreResult<ResourceId> + Send + Sync + 'static,
    {
        self.segments[segment.0].handlers.create = Some(Arc::new(handler));
        self
    }

    /// Attaches a read handler, replacing any previous one.
    pub fn on_read<F>(&mut self, segment: SegmentId, handler: F) -> &mut Self
    where
        F: Fn(&ReadRequest) -> CoreResult<ResultSet> + Send + Sync + 'static,
    {
        self.segments[segment.0].handlers.read = Some(Arc::new(handler));
        self
    }

    /// Attaches an update handler, replacing any previous one.
    pub fn on_update<F>(&mut self, segment: SegmentId, handler: F) -> &mut Self
    where
        F: Fn(&Values, &Selection) -> CoreResult<u64> + Send + Sync + 'static,
    {
        self.segments[segment.0].handlers.update = Some(Arc::new(handler));
        self
    }

    /// Attaches a delete handler, replacing any previous one.
    pub fn on_delete<F>(&mut self, segment: SegmentId, handler: F) -> &mut Self
    where
        F: Fn(&Selection) -> CoreResult<u64> + Send + Sync + 'static,
    {
        self.segments[segment.0].handlers.delete = Some(Arc::new(handler));
        self
    }

    /// Freezes the registered segments into a tree.
    #[must_use]
    pub fn build(self) -> RouteTree {
        RouteTree {
            segments: self.segments,
            roots: self.roots,
        }
    }
}

/// The result of a successful match.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The deepest matched segment.
    pub segment: &'a RouteSegment,
    /// Variables captured along the way.
    pub variables: PathVariables,
}

/// An immutable tree of route segments.
///
/// Built once by [`RouteBuilder::build`]; matching only reads, so a tree can
/// be shared across threads behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    segments: Vec<RouteSegment>,
    roots: Vec<SegmentId>,
}

impl RouteTree {
    /// Returns the segment with the given id.
    pub fn segment(&self, id: SegmentId) -> Option<&RouteSegment> {
        self.segments.get(id.0)
    }

    /// Returns the number of segments in the tree.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if no segment is registered.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Resolves `path` to a segment, capturing path variables.
    ///
    /// Returns `None` if any level has no qualifying child or the path has
    /// no components.
    pub fn find(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut variables = PathVariables::new();
        let mut candidates: &[SegmentId] = &self.roots;
        let mut last = None;

        for raw in split_path(path) {
            let parsed = raw.parse::<i64>().ok();
            let id = self.select(candidates, raw, parsed)?;
            let segment = &self.segments[id.0];

            match segment.component() {
                PathComponent::Literal(_) => {}
                PathComponent::Numeric(name) => {
                    // select() only admits numeric segments for parsed input
                    variables.push(name, Value::Integer(parsed?));
                }
                PathComponent::Text(name) => variables.push(name, Value::Text(raw.to_string())),
            }

            candidates = &segment.children;
            last = Some(segment);
        }

        last.map(|segment| RouteMatch { segment, variables })
    }

    fn select(&self, candidates: &[SegmentId], raw: &str, parsed: Option<i64>) -> Option<SegmentId> {
        let mut variable = None;

        for id in candidates {
            match &self.segments[id.0].component {
                PathComponent::Literal(text) if text == raw => return Some(*id),
                PathComponent::Literal(_) => {}
                PathComponent::Numeric(_) if parsed.is_some() => {
                    variable = variable.or(Some(*id));
                }
                PathComponent::Text(_) if parsed.is_none() => {
                    variable = variable.or(Some(*id));
                }
                PathComponent::Numeric(_) | PathComponent::Text(_) => {}
            }
        }

        variable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Operation;
    use proptest::prelude::*;

    fn items_tree() -> RouteTree {
        let mut builder = RouteBuilder::new();
        let items = builder.add_segment("/shop/items", None);
        builder.add_segment(&RouteBuilder::text_variable("name"), Some(items));
        builder.add_segment(&RouteBuilder::numeric_variable("id"), Some(items));
        let sync = builder.add_segment("sync", Some(items));
        builder.on_create(sync, |_| Ok(1));
        builder.build()
    }

    #[test]
    fn literal_beats_variable() {
        let tree = items_tree();
        let m = tree.find("/shop/items/sync").unwrap();
        assert_eq!(m.segment.component(), &PathComponent::Literal("sync".into()));
        assert!(m.variables.is_empty());
        assert!(m.segment.handlers().has(Operation::Create));
    }

    #[test]
    fn numeric_capture() {
        let tree = items_tree();
        let m = tree.find("shop/items/123").unwrap();
        assert_eq!(m.segment.component(), &PathComponent::Numeric("id".into()));
        assert_eq!(m.variables.get("id"), Some(&Value::Integer(123)));
        assert_eq!(m.variables.len(), 1);
    }

    #[test]
    fn text_capture() {
        let tree = items_tree();
        let m = tree.find("/shop/items/Ahri").unwrap();
        assert_eq!(m.variables.get("name"), Some(&Value::from("Ahri")));
        assert_eq!(m.variables.get("id"), None);
    }

    #[test]
    fn numeric_only_tree_rejects_text() {
        let mut builder = RouteBuilder::new();
        let items = builder.add_segment("items", None);
        builder.add_segment("{id:#}", Some(items));
        let tree = builder.build();

        assert!(tree.find("items/abc").is_none());
        let m = tree.find("items/123").unwrap();
        assert_eq!(m.variables.get("id"), Some(&Value::Integer(123)));
    }

    #[test]
    fn text_only_tree_rejects_integers() {
        let mut builder = RouteBuilder::new();
        builder.add_segment("items/{name:*}", None);
        let tree = builder.build();

        assert!(tree.find("items/42").is_none());
        assert!(tree.find("items/-7").is_none());
        assert!(tree.find("items/4.2").is_some());
    }

    #[test]
    fn failed_match_discards_captures() {
        let mut builder = RouteBuilder::new();
        builder.add_segment("items/{id:#}/children", None);
        let tree = builder.build();

        assert!(tree.find("items/1/parents").is_none());
        assert!(tree.find("items/1/children/extra").is_none());
        assert!(tree.find("").is_none());
        assert!(tree.find("/").is_none());
    }

    #[test]
    fn nested_captures_in_path_order() {
        let mut builder = RouteBuilder::new();
        builder.add_segment("items/{item:*}/children/{child:#}", None);
        let tree = builder.build();

        let m = tree.find("/items/Ahri/children/4").unwrap();
        let captured: Vec<_> = m.variables.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(captured, vec!["item", "child"]);
        assert_eq!(m.variables.get("child"), Some(&Value::Integer(4)));
    }

    #[test]
    fn add_segment_reuses_existing_levels() {
        let mut builder = RouteBuilder::new();
        let a = builder.add_segment("/root/items", None);
        let b = builder.add_segment("root/items", None);
        assert_eq!(a, b);

        let child = builder.add_segment("children", Some(a));
        let again = builder.add_segment("/root/items/children", None);
        assert_eq!(child, again);

        let tree = builder.build();
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn empty_path_returns_parent() {
        let mut builder = RouteBuilder::new();
        let root = builder.add_segment("root", None);
        assert_eq!(builder.add_segment("/", Some(root)), root);
    }

    #[test]
    fn missing_handler_is_visible() {
        let tree = items_tree();
        let m = tree.find("/shop/items").unwrap();
        assert!(m.segment.handlers().operations().is_empty());
    }

    #[test]
    fn tree_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RouteTree>();
    }

    proptest! {
        #[test]
        fn exact_literal_always_wins(word in "[a-z0-9]{1,8}") {
            let mut builder = RouteBuilder::new();
            let items = builder.add_segment("items", None);
            builder.add_segment("{id:#}", Some(items));
            builder.add_segment("{name:*}", Some(items));
            builder.add_segment(&word, Some(items));
            let tree = builder.build();

            let path = format!("items/{word}");
            let m = tree.find(&path).unwrap();
            prop_assert_eq!(m.segment.component(), &PathComponent::Literal(word.clone()));
            prop_assert!(m.variables.is_empty());
        }

        #[test]
        fn integers_bind_numeric_variables(n in any::<i64>()) {
            let mut builder = RouteBuilder::new();
            builder.add_segment("items/{name:*}", None);
            builder.add_segment("items/{id:#}", None);
            let tree = builder.build();

            let path = format!("items/{n}");
            let m = tree.find(&path).unwrap();
            prop_assert_eq!(m.variables.get("id"), Some(&Value::Integer(n)));
            prop_assert_eq!(m.variables.get("name"), None);
        }
    }
}
