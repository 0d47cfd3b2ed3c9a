//! Arena-backed host tree.
//!
//! A [`Document`] stores realized text and element nodes in an arena indexed by [`NodeId`].
//! Slots are never reused, so a stale id can be detected instead of silently aliasing a newer
//! node. Every call that changes the tree bumps [`Document::mutation_count`].

use alloc::{
    rc::Rc,
    string::{String, ToString},
    vec,
    vec::Vec,
};
use core::cell::RefCell;

use brook_core::{Handler, NodeId, PropValue};
use indexmap::IndexMap;

use crate::error::DomError;

/// A document shared between the component shell and event dispatch.
pub type SharedDocument = Rc<RefCell<Document>>;

/// Payload of a realized node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// A text node.
    Text(String),
    /// An element node.
    Element(ElementData),
}

/// Tag, attributes, live properties and listeners of a realized element.
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    tag: String,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, PropValue>,
    listeners: IndexMap<String, Vec<Handler>>,
}

impl ElementData {
    fn new(tag: String) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Iterates attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Returns a live property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropValue> {
        self.properties.get(name)
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }

    /// Returns `true` when the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|name| name == class))
    }
}

#[derive(Debug)]
struct NodeEntry {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

impl NodeEntry {
    const fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            data,
        }
    }
}

/// The realized output tree.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Option<NodeEntry>>,
    root: NodeId,
    mutations: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document whose root is an empty `body` element.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeEntry::new(NodeData::Element(ElementData::new("body".to_string())));
        Self {
            nodes: vec![Some(root)],
            root: NodeId::new(0),
            mutations: 0,
        }
    }

    /// Wraps the document for sharing.
    #[must_use]
    pub fn shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    /// Returns the root element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of tree mutations performed so far.
    #[must_use]
    pub const fn mutation_count(&self) -> usize {
        self.mutations
    }

    /// Returns `true` if the node exists.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    /// Returns the node payload.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.entry(id).ok().map(|entry| &entry.data)
    }

    /// Returns the element payload.
    ///
    /// # Errors
    ///
    /// Fails if the node does not exist or is a text node.
    pub fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        match &self.entry(id)?.data {
            NodeData::Element(element) => Ok(element),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Returns the tag of an element node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).ok().map(ElementData::tag)
    }

    /// Returns the content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.node(id)? {
            NodeData::Text(value) => Some(value),
            NodeData::Element(_) => None,
        }
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(NodeData::Element(_)))
    }

    /// Returns `true` for text nodes.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.node(id), Some(NodeData::Text(_)))
    }

    /// Returns an attribute of an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).ok()?.attribute(name)
    }

    /// Returns a live property of an element node.
    #[must_use]
    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.element(id).ok()?.property(name)
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, value: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(value.into()))
    }

    /// Creates a detached element node.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeData::Element(ElementData::new(tag.into())))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Some(NodeEntry::new(data)));
        id
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, DomError> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(DomError::UnknownNode(id))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, DomError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(DomError::UnknownNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        match &mut self.entry_mut(id)?.data {
            NodeData::Element(element) => Ok(element),
            NodeData::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.entry(id).ok()?.parent
    }

    /// Returns the children of a node. Unknown nodes have none.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.entry(id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).get(index).copied()
    }

    /// Returns `true` if the node has children.
    #[must_use]
    pub fn has_child_nodes(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&child| child == id)?;
        siblings.get(index + 1).copied()
    }

    /// Returns the position of a node among its siblings.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.children(self.parent(id)?)
            .iter()
            .position(|&child| child == id)
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Inserts `child` into `parent` before `anchor`, or at the end when `anchor` is `None`.
    ///
    /// An attached child is moved, not copied.
    ///
    /// # Errors
    ///
    /// Fails when a node is unknown, `parent` is a text node, `anchor` is not a child of
    /// `parent`, or `child` is an ancestor of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        anchor: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.element(parent)?;
        self.entry(child)?;
        if anchor == Some(child) {
            return Ok(());
        }
        if let Some(anchor) = anchor
            && self.parent(anchor) != Some(parent)
        {
            return Err(DomError::NotAChild {
                parent,
                child: anchor,
            });
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::Cycle { parent, child });
        }

        self.detach(child)?;
        let index = match anchor {
            Some(anchor) => self.index_of(anchor).ok_or(DomError::NotAChild {
                parent,
                child: anchor,
            })?,
            None => self.children(parent).len(),
        };
        self.entry_mut(parent)?.children.insert(index, child);
        self.entry_mut(child)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    /// Appends `child` to `parent`.
    ///
    /// # Errors
    ///
    /// See [`insert_before`](Self::insert_before).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Detaches `child` from `parent` without destroying it.
    ///
    /// # Errors
    ///
    /// Fails if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.entry(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.mutations += 1;
        Ok(())
    }

    /// Puts `new` where `old` was and detaches `old`.
    ///
    /// # Errors
    ///
    /// Fails if `old` is not a child of `parent`.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<(), DomError> {
        if new == old {
            return Ok(());
        }
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.entry(child)?.parent else {
            return Ok(());
        };
        self.entry_mut(parent)?.children.retain(|&id| id != child);
        self.entry_mut(child)?.parent = None;
        Ok(())
    }

    /// Detaches a node and frees it together with its whole subtree.
    ///
    /// # Errors
    ///
    /// Fails if the node does not exist.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(entry) = self.nodes.get_mut(next.index()).and_then(Option::take) {
                stack.extend(entry.children);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    /// Destroys every child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` does not exist.
    pub fn clear_children(&mut self, parent: NodeId) -> Result<(), DomError> {
        let children = core::mem::take(&mut self.entry_mut(parent)?.children);
        for child in children {
            self.entry_mut(child)?.parent = None;
            self.destroy(child)?;
        }
        Ok(())
    }

    /// Replaces the content of a text node.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not a text node.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<(), DomError> {
        match &mut self.entry_mut(id)?.data {
            NodeData::Text(text) => *text = value.into(),
            NodeData::Element(_) => return Err(DomError::NotText(id)),
        }
        self.mutations += 1;
        Ok(())
    }

    /// Sets an attribute.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .attributes
            .insert(name.into(), value.into());
        self.mutations += 1;
        Ok(())
    }

    /// Removes an attribute. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not an element.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<bool, DomError> {
        let removed = self
            .element_mut(id)?
            .attributes
            .shift_remove(name)
            .is_some();
        if removed {
            self.mutations += 1;
        }
        Ok(removed)
    }

    /// Sets or clears a live property such as `value` or `checked`.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not an element.
    pub fn set_property(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: Option<PropValue>,
    ) -> Result<(), DomError> {
        let properties = &mut self.element_mut(id)?.properties;
        let name = name.into();
        match value {
            Some(value) => {
                properties.insert(name, value);
            }
            None => {
                properties.shift_remove(&name);
            }
        }
        self.mutations += 1;
        Ok(())
    }

    /// Registers a listener for `event`.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not an element.
    pub fn add_listener(
        &mut self,
        id: NodeId,
        event: impl Into<String>,
        handler: Handler,
    ) -> Result<(), DomError> {
        self.element_mut(id)?
            .listeners
            .entry(event.into())
            .or_default()
            .push(handler);
        self.mutations += 1;
        Ok(())
    }

    /// Unregisters a listener. Returns whether it was registered.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or not an element.
    pub fn remove_listener(
        &mut self,
        id: NodeId,
        event: &str,
        handler: &Handler,
    ) -> Result<bool, DomError> {
        let Some(handlers) = self.element_mut(id)?.listeners.get_mut(event) else {
            return Ok(false);
        };
        let Some(index) = handlers.iter().position(|h| h.ptr_eq(handler)) else {
            return Ok(false);
        };
        handlers.remove(index);
        self.mutations += 1;
        Ok(true)
    }

    /// Returns the listeners registered for `event` on a node.
    #[must_use]
    pub fn listeners(&self, id: NodeId, event: &str) -> Vec<Handler> {
        self.element(id)
            .ok()
            .and_then(|element| element.listeners.get(event))
            .cloned()
            .unwrap_or_default()
    }

    /// Descendants of `root` in document order, excluding `root`.
    #[must_use]
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of a node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }
}
