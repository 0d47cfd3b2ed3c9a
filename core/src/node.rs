//! The description tree consumed by the reconciler, the hydrator and the stream renderer.
//!
//! A [`VNode`] is either a text node, an element, or a fragment (an ordered list of roots).
//! Text and element nodes carry a back-reference to the realized node they were mounted as.
//! That reference is written by the reconciler only; it is `None` before mount and after
//! unmount, and it is never copied by [`Clone`].

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::{cell::Cell, fmt};

use indexmap::IndexMap;

use crate::{
    event::{Event, Handler},
    prop::{PropValue, is_preserve_key},
};

/// Identity of a realized node inside a host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates a [`NodeId`] from a raw index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Insertion-ordered element properties.
pub type PropMap = IndexMap<String, PropValue>;

/// A description node.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    /// A text node.
    Text(Text),
    /// An element with properties and children.
    Element(Element),
    /// Several roots rendered in order without a wrapper.
    Fragment(Vec<VNode>),
}

impl VNode {
    /// Creates a text node.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Text::new(value))
    }

    /// The node that renders nothing.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    /// Creates a fragment. Nested fragments are flattened.
    pub fn fragment<I>(nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Self>,
    {
        let mut flat = Vec::new();
        for node in nodes {
            push_flat(&mut flat, node.into());
        }
        Self::Fragment(flat)
    }

    /// Returns the reconciliation key of an element.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Element(element) => element.key_str(),
            _ => None,
        }
    }

    /// Returns the realized node this description is mounted as.
    #[must_use]
    pub fn el(&self) -> Option<NodeId> {
        match self {
            Self::Text(text) => text.el(),
            Self::Element(element) => element.el(),
            Self::Fragment(_) => None,
        }
    }

    /// Records the realized node. Reserved for the reconciler and hydrator.
    pub fn set_el(&self, el: Option<NodeId>) {
        match self {
            Self::Text(text) => text.set_el(el),
            Self::Element(element) => element.set_el(el),
            Self::Fragment(_) => {}
        }
    }

    /// Returns `true` for fragments.
    #[must_use]
    pub const fn is_fragment(&self) -> bool {
        matches!(self, Self::Fragment(_))
    }

    /// Returns the element, if this is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the text node, if this is one.
    #[must_use]
    pub const fn as_text(&self) -> Option<&Text> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Views the node as a list of roots: a fragment's entries, or the node itself.
    #[must_use]
    pub fn as_slice(&self) -> &[Self] {
        match self {
            Self::Fragment(nodes) => nodes,
            node => core::slice::from_ref(node),
        }
    }

    /// Converts the node into a list of roots.
    #[must_use]
    pub fn into_roots(self) -> Vec<Self> {
        match self {
            Self::Fragment(nodes) => nodes,
            node => alloc::vec![node],
        }
    }
}

fn push_flat(out: &mut Vec<VNode>, node: VNode) {
    match node {
        VNode::Fragment(nodes) => {
            for node in nodes {
                push_flat(out, node);
            }
        }
        node => out.push(node),
    }
}

impl From<Text> for VNode {
    fn from(value: Text) -> Self {
        Self::Text(value)
    }
}

impl From<Element> for VNode {
    fn from(value: Element) -> Self {
        Self::Element(value)
    }
}

impl From<Vec<Self>> for VNode {
    fn from(value: Vec<Self>) -> Self {
        Self::fragment(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for VNode {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::empty, Into::into)
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<&String> for VNode {
    fn from(value: &String) -> Self {
        Self::text(value.as_str())
    }
}

macro_rules! impl_numeric_text {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for VNode {
                fn from(value: $ty) -> Self {
                    Self::text(value.to_string())
                }
            }
        )*
    };
}

impl_numeric_text!(i32, i64, u32, u64, usize, f32, f64);

/// Creates a text node.
pub fn text(value: impl Into<String>) -> VNode {
    VNode::text(value)
}

/// Starts building an element.
pub fn h(tag: impl Into<String>) -> Element {
    Element::new(tag)
}

/// A text description node.
pub struct Text {
    value: String,
    el: Cell<Option<NodeId>>,
}

impl Text {
    /// Creates a text node.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            el: Cell::new(None),
        }
    }

    /// Returns the text content.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consumes the node and returns its content.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }

    /// Returns the realized node.
    #[must_use]
    pub fn el(&self) -> Option<NodeId> {
        self.el.get()
    }

    /// Records the realized node.
    pub fn set_el(&self, el: Option<NodeId>) {
        self.el.set(el);
    }
}

impl Clone for Text {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Text").field(&self.value).finish()
    }
}

/// An element description node, built with chained methods.
///
/// ```rust
/// use brook_core::{Event, h};
///
/// let button = h("button")
///     .attr("type", "button")
///     .on("click", |_: &Event| {})
///     .child("Save");
/// assert_eq!(button.tag(), "button");
/// ```
pub struct Element {
    tag: String,
    props: PropMap,
    children: Vec<VNode>,
    key: Option<String>,
    el: Cell<Option<NodeId>>,
}

impl Element {
    /// Creates an element without properties or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            props: PropMap::new(),
            children: Vec::new(),
            key: None,
            el: Cell::new(None),
        }
    }

    /// Sets a property. The `key` property becomes the reconciliation key.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == "key" {
            self.key = match value {
                PropValue::Str(key) => Some(key),
                _ => None,
            };
        } else {
            self.props.insert(name, value);
        }
        self
    }

    /// Sets a boolean attribute; `false` leaves it out of the output.
    #[must_use]
    pub fn bool_attr(self, name: impl Into<String>, on: bool) -> Self {
        self.attr(name, on)
    }

    /// Sets the `class` attribute.
    #[must_use]
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value.into())
    }

    /// Attaches an event handler under `on{event}`.
    #[must_use]
    pub fn on(self, event: &str, handler: impl Into<Handler>) -> Self {
        let key = alloc::format!("on{event}");
        self.attr(key, PropValue::Handler(handler.into()))
    }

    /// Sets the reconciliation key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Marks the element so its children are left alone by patching and hydration.
    #[must_use]
    pub fn preserve(self) -> Self {
        self.attr("preserve", true)
    }

    /// Appends a child. Fragments are flattened and empty values are dropped.
    #[must_use]
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        push_flat(&mut self.children, child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        for child in children {
            push_flat(&mut self.children, child.into());
        }
        self
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the properties in insertion order.
    #[must_use]
    pub const fn props(&self) -> &PropMap {
        &self.props
    }

    /// Returns a property value.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    /// Returns the children.
    #[must_use]
    pub fn child_nodes(&self) -> &[VNode] {
        &self.children
    }

    /// Returns the reconciliation key.
    #[must_use]
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Returns `true` when a preserve marker is set to a truthy value.
    #[must_use]
    pub fn is_preserved(&self) -> bool {
        self.props
            .iter()
            .any(|(name, value)| is_preserve_key(name) && !value.is_falsy())
    }

    /// Returns the realized node.
    #[must_use]
    pub fn el(&self) -> Option<NodeId> {
        self.el.get()
    }

    /// Records the realized node.
    pub fn set_el(&self, el: Option<NodeId>) {
        self.el.set(el);
    }

    /// Splits the element into tag, properties and children.
    #[must_use]
    pub fn into_parts(self) -> (String, PropMap, Vec<VNode>) {
        (self.tag, self.props, self.children)
    }

    /// Invokes every handler registered for `event` directly, without a host tree.
    ///
    /// Useful for exercising handlers of a description produced on the server.
    pub fn emit(&self, event: &Event) {
        for (name, value) in &self.props {
            if let (Some(handler), Some(event_name)) =
                (value.as_handler(), crate::prop::event_name(name))
                && event_name == event.name()
            {
                handler.call(event);
            }
        }
    }
}

impl Clone for Element {
    fn clone(&self) -> Self {
        Self {
            tag: self.tag.clone(),
            props: self.props.clone(),
            children: self.children.clone(),
            key: self.key.clone(),
            el: Cell::new(None),
        }
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.key == other.key
            && self.props == other.props
            && self.children == other.children
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Element");
        debug.field("tag", &self.tag);
        if let Some(key) = &self.key {
            debug.field("key", key);
        }
        debug
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn children_are_flattened() {
        let list = h("ul").child(VNode::fragment(vec![
            VNode::from(h("li")),
            VNode::fragment(vec![h("li"), h("li")]),
        ]));
        assert_eq!(list.child_nodes().len(), 3);
    }

    #[test]
    fn none_children_are_dropped() {
        let node = h("div")
            .child(Option::<Element>::None)
            .child(Some("shown"))
            .child(false.then(|| h("span")));
        assert_eq!(node.child_nodes(), &[VNode::text("shown")]);
    }

    #[test]
    fn key_prop_sets_the_key() {
        let node = h("li").attr("key", "a").attr("id", "x");
        assert_eq!(node.key_str(), Some("a"));
        assert!(node.prop("key").is_none());
        assert_eq!(node.props().len(), 1);
    }

    #[test]
    fn props_keep_insertion_order() {
        let node = h("a").attr("href", "/").attr("class", "nav").attr("title", "Home");
        let names: Vec<&str> = node.props().keys().map(String::as_str).collect();
        assert_eq!(names, ["href", "class", "title"]);
    }

    #[test]
    fn clones_drop_the_realized_reference() {
        let node = VNode::text("x");
        node.set_el(Some(NodeId::new(3)));
        assert_eq!(node.el(), Some(NodeId::new(3)));
        assert_eq!(node.clone().el(), None);
    }

    #[test]
    fn preserve_marker() {
        assert!(h("nav").preserve().is_preserved());
        assert!(h("nav").attr("z-preserve", "").is_preserved());
        assert!(!h("nav").attr("preserve", false).is_preserved());
    }

    #[test]
    fn emit_reaches_matching_handlers() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let clicks = Rc::new(Cell::new(0));
        let node = h("button")
            .on("click", {
                let clicks = clicks.clone();
                move |_: &Event| clicks.set(clicks.get() + 1)
            })
            .on("focus", |_: &Event| {});
        node.emit(&Event::new("click"));
        node.emit(&Event::new("blur"));
        assert_eq!(clicks.get(), 1);
    }
}
