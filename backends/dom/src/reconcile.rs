//! Mounting, unmounting and patching realized nodes against description trees.
//!
//! Every function takes the document explicitly; nothing here keeps state between calls. The
//! realized-node back-reference of a description node is written by [`mount`], moved to the
//! new description by [`patch`] and cleared by [`unmount`].

use alloc::{collections::VecDeque, vec::Vec};
use core::ptr;

use brook_core::{Element, NodeId, PropKind, PropMap, PropValue, ReconcileError, VNode, prop};
use indexmap::IndexMap;

use crate::document::Document;

/// Creates realized nodes for `node` and inserts them into `container` before `anchor`, or at
/// the end when `anchor` is `None`. Fragments mount each entry in order without a wrapper.
///
/// # Errors
///
/// Fails if `container` is not an element or `anchor` is not one of its children.
pub fn mount(
    doc: &mut Document,
    node: &VNode,
    container: NodeId,
    anchor: Option<NodeId>,
) -> Result<(), ReconcileError> {
    match node {
        VNode::Fragment(nodes) => {
            for node in nodes {
                mount(doc, node, container, anchor)?;
            }
        }
        VNode::Text(text) => {
            let id = doc.create_text(text.value());
            doc.insert_before(container, id, anchor)?;
            text.set_el(Some(id));
        }
        VNode::Element(element) => {
            let id = create_element(doc, element)?;
            doc.insert_before(container, id, anchor)?;
            element.set_el(Some(id));
        }
    }
    Ok(())
}

fn create_element(doc: &mut Document, element: &Element) -> Result<NodeId, ReconcileError> {
    let id = doc.create_element(element.tag());
    for (key, value) in element.props() {
        apply_prop(doc, id, key, None, Some(value))?;
    }
    for child in element.child_nodes() {
        mount(doc, child, id, None)?;
    }
    Ok(id)
}

/// Removes the realized output of `node` from its parent and frees it.
///
/// # Errors
///
/// Returns [`ReconcileError::NotMounted`] if a text or element node has no realized node.
pub fn unmount(doc: &mut Document, node: &VNode) -> Result<(), ReconcileError> {
    if let VNode::Fragment(nodes) = node {
        for node in nodes {
            unmount(doc, node)?;
        }
        return Ok(());
    }
    let id = node.el().ok_or(ReconcileError::NotMounted)?;
    doc.destroy(id)?;
    forget(node);
    Ok(())
}

fn forget(node: &VNode) {
    node.set_el(None);
    match node {
        VNode::Element(element) => element.child_nodes().iter().for_each(forget),
        VNode::Fragment(nodes) => nodes.iter().for_each(forget),
        VNode::Text(_) => {}
    }
}

/// Reconciles the realized output of `old` so it matches `new`.
///
/// # Errors
///
/// Fails when `old` is not mounted or the host tree is not in the expected shape.
pub fn patch(
    doc: &mut Document,
    old: &VNode,
    new: &VNode,
    container: NodeId,
) -> Result<(), ReconcileError> {
    if ptr::eq(old, new) {
        return Ok(());
    }
    match (old, new) {
        (VNode::Fragment(_), _) | (_, VNode::Fragment(_)) => {
            diff_children(doc, old.as_slice(), new.as_slice(), container)
        }
        (VNode::Text(before), VNode::Text(after)) => {
            let id = before.el().ok_or(ReconcileError::NotMounted)?;
            if before.value() != after.value() {
                doc.set_text(id, after.value())?;
            }
            before.set_el(None);
            after.set_el(Some(id));
            Ok(())
        }
        (VNode::Element(before), VNode::Element(after)) if before.tag() == after.tag() => {
            let id = before.el().ok_or(ReconcileError::NotMounted)?;
            before.set_el(None);
            after.set_el(Some(id));
            diff_props(doc, id, before.props(), after.props())?;
            if after.is_preserved() {
                carry_refs(before.child_nodes(), after.child_nodes());
                Ok(())
            } else {
                diff_children(doc, before.child_nodes(), after.child_nodes(), id)
            }
        }
        _ => replace(doc, old, new, container),
    }
}

fn replace(
    doc: &mut Document,
    old: &VNode,
    new: &VNode,
    container: NodeId,
) -> Result<(), ReconcileError> {
    let id = old.el().ok_or(ReconcileError::NotMounted)?;
    let parent = doc.parent(id).unwrap_or(container);
    let anchor = doc.next_sibling(id);
    unmount(doc, old)?;
    mount(doc, new, parent, anchor)
}

/// Hands the realized children of a preserved element to its new description, position by
/// position, so a later non-preserved patch still finds them.
fn carry_refs(old: &[VNode], new: &[VNode]) {
    for (before, after) in old.iter().zip(new) {
        match (before, after) {
            (VNode::Text(_), VNode::Text(_)) => after.set_el(before.el()),
            (VNode::Element(b), VNode::Element(a)) if b.tag() == a.tag() => {
                a.set_el(b.el());
                carry_refs(b.child_nodes(), a.child_nodes());
            }
            _ => {}
        }
    }
}

fn diff_props(
    doc: &mut Document,
    id: NodeId,
    old: &PropMap,
    new: &PropMap,
) -> Result<(), ReconcileError> {
    for (key, value) in new {
        let previous = old.get(key);
        if previous != Some(value) {
            apply_prop(doc, id, key, previous, Some(value))?;
        }
    }
    for (key, value) in old {
        if !new.contains_key(key) {
            apply_prop(doc, id, key, Some(value), None)?;
        }
    }
    Ok(())
}

/// Applies a single property change to a realized element.
///
/// # Errors
///
/// Fails if `id` is not a live element.
pub fn apply_prop(
    doc: &mut Document,
    id: NodeId,
    key: &str,
    old: Option<&PropValue>,
    new: Option<&PropValue>,
) -> Result<(), ReconcileError> {
    match PropKind::of(key) {
        PropKind::Handler => {
            let Some(event) = prop::event_name(key) else {
                return Ok(());
            };
            if let Some(handler) = old.and_then(PropValue::as_handler) {
                doc.remove_listener(id, &event, handler)?;
            }
            if let Some(handler) = new.and_then(PropValue::as_handler) {
                doc.add_listener(id, event, handler.clone())?;
            }
        }
        PropKind::Live => doc.set_property(id, key, new.cloned())?,
        PropKind::Class => set_attribute(doc, id, "class", new)?,
        PropKind::Attribute => set_attribute(doc, id, key, new)?,
    }
    Ok(())
}

fn set_attribute(
    doc: &mut Document,
    id: NodeId,
    name: &str,
    value: Option<&PropValue>,
) -> Result<(), ReconcileError> {
    match value {
        Some(PropValue::Str(value)) => doc.set_attribute(id, name, value.as_str())?,
        Some(PropValue::Bool(true)) => doc.set_attribute(id, name, "")?,
        Some(PropValue::Bool(false)) | None => {
            doc.remove_attribute(id, name)?;
        }
        Some(PropValue::Handler(_)) => {}
    }
    Ok(())
}

pub(crate) fn flatten<'a>(nodes: &'a [VNode], out: &mut Vec<&'a VNode>) {
    for node in nodes {
        match node {
            VNode::Fragment(inner) => flatten(inner, out),
            node => out.push(node),
        }
    }
}

/// Reconciles a list of children inside `container`.
///
/// Keyed children are matched by key and unkeyed children by position, independently of each
/// other. Matched nodes are patched and moved into place; unmatched new nodes are mounted at
/// their index; old nodes left over are unmounted.
///
/// # Errors
///
/// Fails when an old child is not mounted or the host tree is not in the expected shape.
pub fn diff_children(
    doc: &mut Document,
    old: &[VNode],
    new: &[VNode],
    container: NodeId,
) -> Result<(), ReconcileError> {
    let (mut old_flat, mut new_flat) = (Vec::new(), Vec::new());
    flatten(old, &mut old_flat);
    flatten(new, &mut new_flat);

    if old_flat.is_empty() {
        for node in new_flat {
            mount(doc, node, container, None)?;
        }
        return Ok(());
    }
    if new_flat.is_empty() {
        for node in old_flat {
            unmount(doc, node)?;
        }
        return Ok(());
    }

    let mut keyed: IndexMap<&str, &VNode> = IndexMap::new();
    let mut unkeyed: VecDeque<&VNode> = VecDeque::new();
    let mut duplicates: Vec<&VNode> = Vec::new();
    for node in old_flat {
        match node.key() {
            Some(key) if keyed.contains_key(key) => duplicates.push(node),
            Some(key) => {
                keyed.insert(key, node);
            }
            None => unkeyed.push_back(node),
        }
    }

    for (index, node) in new_flat.into_iter().enumerate() {
        let matched = match node.key() {
            Some(key) => keyed.shift_remove(key),
            None => unkeyed.pop_front(),
        };
        match matched {
            Some(previous) => {
                patch(doc, previous, node, container)?;
                let id = node.el().ok_or(ReconcileError::NotMounted)?;
                let anchor = doc.child_at(container, index);
                if anchor != Some(id) {
                    doc.insert_before(container, id, anchor)?;
                }
            }
            None => {
                let anchor = doc.child_at(container, index);
                mount(doc, node, container, anchor)?;
            }
        }
    }

    for node in keyed.into_values().chain(unkeyed).chain(duplicates) {
        unmount(doc, node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{rc::Rc, vec};
    use brook_core::{Event, Handler, h};
    use core::cell::Cell;

    use crate::{dispatch_event, document::SharedDocument};

    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, container).expect("append");
        (doc, container)
    }

    fn item(key: &str, label: &str) -> VNode {
        h("li").key(key).child(label).into()
    }

    fn els(nodes: &VNode) -> Vec<NodeId> {
        nodes
            .as_slice()
            .iter()
            .map(|node| node.el().expect("mounted"))
            .collect()
    }

    #[test]
    fn patching_a_node_with_itself_is_free() {
        let (mut doc, container) = setup();
        let tree: VNode = h("section")
            .attr("id", "s")
            .on("click", |_: &Event| {})
            .children([item("a", "A"), item("b", "B")])
            .child("tail")
            .into();
        mount(&mut doc, &tree, container, None).expect("mount");

        let before = doc.mutation_count();
        patch(&mut doc, &tree, &tree, container).expect("patch");
        assert_eq!(doc.mutation_count(), before);
    }

    #[test]
    fn patching_an_equal_copy_is_free() {
        let (mut doc, container) = setup();
        let handler = Handler::new(|_: &Event| {});
        let tree: VNode = h("form")
            .attr("action", "/save")
            .attr("novalidate", true)
            .attr("onsubmit", handler)
            .child(h("input").attr("value", "x"))
            .children([item("a", "A"), item("b", "B")])
            .into();
        mount(&mut doc, &tree, container, None).expect("mount");

        let copy = tree.clone();
        let before = doc.mutation_count();
        patch(&mut doc, &tree, &copy, container).expect("patch");
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(copy.el(), doc.first_child(container));
    }

    #[test]
    fn mount_then_unmount_restores_the_container() {
        let (mut doc, container) = setup();
        let existing = doc.create_text("keep");
        doc.append_child(container, existing).expect("append");
        let snapshot = doc.children(container).to_vec();

        let tree = VNode::fragment([
            VNode::from(h("p").child("one")),
            VNode::text("two"),
            VNode::from(h("ul").children([item("a", "A")])),
        ]);
        mount(&mut doc, &tree, container, None).expect("mount");
        assert_eq!(doc.children(container).len(), 4);
        unmount(&mut doc, &tree).expect("unmount");

        assert_eq!(doc.children(container), snapshot.as_slice());
        assert!(tree.as_slice().iter().all(|node| node.el().is_none()));
    }

    #[test]
    fn mount_respects_the_anchor() {
        let (mut doc, container) = setup();
        let last = doc.create_text("!");
        doc.append_child(container, last).expect("append");
        let tree = VNode::fragment(["a", "b"]);
        mount(&mut doc, &tree, container, Some(last)).expect("mount");
        assert_eq!(doc.text_content(container), "ab!");
    }

    #[test]
    fn keyed_reorder_moves_without_recreating() {
        let (mut doc, container) = setup();
        let old = VNode::fragment([item("a", "A"), item("b", "B"), item("c", "C")]);
        mount(&mut doc, &old, container, None).expect("mount");
        let [a, b, c] = els(&old)[..] else {
            panic!("three roots");
        };

        let new = VNode::fragment([item("a", "A"), item("c", "C"), item("b", "B")]);
        let before = doc.mutation_count();
        patch(&mut doc, &old, &new, container).expect("patch");

        assert_eq!(doc.children(container), &[a, c, b]);
        assert_eq!(doc.text_content(container), "ACB");
        assert_eq!(doc.mutation_count(), before + 1);
        assert_eq!(els(&new), vec![a, c, b]);
    }

    #[test]
    fn keyed_insert_and_delete() {
        let (mut doc, container) = setup();
        let old = VNode::fragment([item("a", "A"), item("b", "B"), item("c", "C")]);
        mount(&mut doc, &old, container, None).expect("mount");
        let [a, b, c] = els(&old)[..] else {
            panic!("three roots");
        };

        let new = VNode::fragment([item("d", "D"), item("c", "C"), item("a", "A")]);
        patch(&mut doc, &old, &new, container).expect("patch");

        assert_eq!(doc.text_content(container), "DCA");
        let children = doc.children(container);
        assert_eq!(&children[1..], &[c, a]);
        assert!(!doc.contains(b));
    }

    #[test]
    fn unkeyed_shrink_reuses_the_first_node() {
        let (mut doc, container) = setup();
        let old = VNode::fragment(["1", "2", "3"]);
        mount(&mut doc, &old, container, None).expect("mount");
        let first = els(&old)[0];

        let new = VNode::fragment(["9"]);
        patch(&mut doc, &old, &new, container).expect("patch");

        assert_eq!(doc.children(container), &[first]);
        assert_eq!(doc.text(first), Some("9"));
    }

    #[test]
    fn keyed_and_unkeyed_children_never_match_each_other() {
        let (mut doc, container) = setup();
        let old = VNode::fragment([item("a", "A"), VNode::from(h("li").child("x"))]);
        mount(&mut doc, &old, container, None).expect("mount");
        let [keyed, unkeyed] = els(&old)[..] else {
            panic!("two roots");
        };

        let new = VNode::fragment([VNode::from(h("li").child("y")), item("a", "A")]);
        patch(&mut doc, &old, &new, container).expect("patch");

        assert_eq!(doc.children(container), &[unkeyed, keyed]);
        assert_eq!(doc.text_content(container), "yA");
    }

    #[test]
    fn kind_change_replaces_in_place() {
        let (mut doc, container) = setup();
        let old = VNode::fragment([VNode::text("a"), VNode::text("b"), VNode::text("c")]);
        mount(&mut doc, &old, container, None).expect("mount");
        let [a, b, c] = els(&old)[..] else {
            panic!("three roots");
        };

        let new = VNode::fragment([
            VNode::text("a"),
            VNode::from(h("em").child("B")),
            VNode::text("c"),
        ]);
        patch(&mut doc, &old, &new, container).expect("patch");

        let children = doc.children(container);
        assert_eq!(children[0], a);
        assert_eq!(children[2], c);
        assert!(!doc.contains(b));
        assert_eq!(doc.inner_html(container), "a<em>B</em>c");
    }

    #[test]
    fn tag_change_replaces_the_root() {
        let (mut doc, container) = setup();
        let old: VNode = h("p").child("x").into();
        mount(&mut doc, &old, container, None).expect("mount");
        let new: VNode = h("h1").child("x").into();
        patch(&mut doc, &old, &new, container).expect("patch");
        assert_eq!(doc.inner_html(container), "<h1>x</h1>");
        assert!(old.el().is_none());
    }

    #[test]
    fn props_are_diffed() {
        let (mut doc, container) = setup();
        let old: VNode = h("input")
            .attr("className", "a")
            .attr("title", "t")
            .attr("disabled", true)
            .attr("value", "1")
            .into();
        mount(&mut doc, &old, container, None).expect("mount");
        let id = old.el().expect("mounted");
        assert_eq!(doc.attribute(id, "class"), Some("a"));
        assert_eq!(doc.attribute(id, "disabled"), Some(""));
        assert_eq!(doc.attribute(id, "value"), None);
        assert_eq!(doc.property(id, "value"), Some(&PropValue::from("1")));

        let new: VNode = h("input")
            .attr("className", "b")
            .attr("disabled", false)
            .attr("value", "2")
            .into();
        patch(&mut doc, &old, &new, container).expect("patch");
        assert_eq!(doc.attribute(id, "class"), Some("b"));
        assert_eq!(doc.attribute(id, "title"), None);
        assert_eq!(doc.attribute(id, "disabled"), None);
        assert_eq!(doc.property(id, "value"), Some(&PropValue::from("2")));
    }

    #[test]
    fn handlers_are_swapped() {
        let doc: SharedDocument = Document::new().shared();
        let container = {
            let mut doc = doc.borrow_mut();
            let container = doc.create_element("div");
            let root = doc.root();
            doc.append_child(root, container).expect("append");
            container
        };
        let (first, second) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
        let counter = |count: &Rc<Cell<i32>>| {
            let count = count.clone();
            move |_: &Event| count.set(count.get() + 1)
        };

        let old: VNode = h("button").on("click", counter(&first)).into();
        mount(&mut doc.borrow_mut(), &old, container, None).expect("mount");
        let button = old.el().expect("mounted");
        dispatch_event(&doc, button, Event::new("click"));

        let new: VNode = h("button").on("click", counter(&second)).into();
        patch(&mut doc.borrow_mut(), &old, &new, container).expect("patch");
        dispatch_event(&doc, button, Event::new("click"));

        assert_eq!((first.get(), second.get()), (1, 1));
        assert_eq!(doc.borrow().listeners(button, "click").len(), 1);
    }

    #[test]
    fn preserved_children_are_left_alone() {
        let (mut doc, container) = setup();
        let old: VNode = h("nav").preserve().child(h("a").child("Home")).into();
        mount(&mut doc, &old, container, None).expect("mount");
        let nav = old.el().expect("mounted");

        let new: VNode = h("nav").preserve().child(h("a").child("Other")).into();
        patch(&mut doc, &old, &new, container).expect("patch");
        assert_eq!(doc.text_content(nav), "Home");

        let released: VNode = h("nav").child(h("a").child("Next")).into();
        patch(&mut doc, &new, &released, container).expect("patch");
        assert_eq!(doc.text_content(nav), "Next");
        assert_eq!(doc.attribute(nav, "preserve"), None);
    }

    #[test]
    fn unmounting_an_unmounted_node_fails() {
        let (mut doc, _) = setup();
        assert_eq!(
            unmount(&mut doc, &VNode::text("x")),
            Err(ReconcileError::NotMounted)
        );
    }

    #[test]
    fn empty_lists_take_the_fast_paths() {
        let (mut doc, container) = setup();
        let items = VNode::fragment([item("a", "A"), item("b", "B")]);
        diff_children(&mut doc, &[], items.as_slice(), container).expect("mount all");
        assert_eq!(doc.children(container).len(), 2);
        diff_children(&mut doc, items.as_slice(), &[], container).expect("unmount all");
        assert!(!doc.has_child_nodes(container));
    }
}
