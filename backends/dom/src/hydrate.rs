//! Adopting server-rendered output into a live tree.
//!
//! Hydration walks the realized children of a container in lockstep with a description tree.
//! Matching nodes are adopted in place and only their handlers are attached; static
//! attributes are assumed correct. Mismatches are repaired locally by replacing the offending
//! node and are reported through [`HydrationReport`] and the `brook::hydrate` log target.
//!
//! Streamed markup loses text boundaries: adjacent text nodes arrive as one host text node and
//! empty text produces nothing. The hydrator splits merged text where the next description is
//! text as well, and gives empty text a fresh node without consuming server output.

use alloc::{string::String, vec::Vec};

use brook_core::{Element, NodeId, PropKind, ReconcileError, Text, VNode};

use crate::{
    document::Document,
    reconcile::{apply_prop, flatten, mount},
};

/// What a hydration pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    /// Realized nodes adopted as they were.
    pub adopted: usize,
    /// Realized nodes discarded and replaced by a fresh mount.
    pub replaced: usize,
    /// Adopted text nodes whose content had to be corrected.
    pub repaired: usize,
    /// Description nodes mounted because no realized node was left.
    pub mounted: usize,
    /// Event listeners attached.
    pub listeners: usize,
    /// Text nodes created for boundaries the markup could not carry.
    pub synthesized: usize,
}

impl HydrationReport {
    /// Returns `true` when every description node was adopted without repair.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.replaced == 0 && self.repaired == 0 && self.mounted == 0
    }
}

enum Claim {
    Exact,
    Split(String),
    Repair,
}

fn is_empty_text(node: &VNode) -> bool {
    matches!(node, VNode::Text(text) if text.value().is_empty())
}

struct Hydrator<'a> {
    doc: &'a mut Document,
    report: HydrationReport,
}

/// Adopts the existing children of `container` for `node`.
///
/// Trailing realized nodes that no description claims are left in place.
///
/// # Errors
///
/// Fails only when the host tree rejects a repair, for example because `container` is not an
/// element.
pub fn hydrate(
    doc: &mut Document,
    node: &VNode,
    container: NodeId,
) -> Result<HydrationReport, ReconcileError> {
    let mut hydrator = Hydrator {
        doc,
        report: HydrationReport::default(),
    };
    let cursor = hydrator.doc.first_child(container);
    hydrator.children(node.as_slice(), container, cursor)?;
    tracing::debug!(
        target: "brook::hydrate",
        adopted = hydrator.report.adopted,
        replaced = hydrator.report.replaced,
        repaired = hydrator.report.repaired,
        mounted = hydrator.report.mounted,
        "hydration finished"
    );
    Ok(hydrator.report)
}

impl Hydrator<'_> {
    fn children(
        &mut self,
        nodes: &[VNode],
        parent: NodeId,
        mut cursor: Option<NodeId>,
    ) -> Result<Option<NodeId>, ReconcileError> {
        let mut flat = Vec::new();
        flatten(nodes, &mut flat);
        for (index, node) in flat.iter().enumerate() {
            let text_follows = flat[index + 1..]
                .iter()
                .find(|next| !is_empty_text(next))
                .is_some_and(|next| matches!(next, VNode::Text(_)));
            cursor = self.node(node, parent, cursor, text_follows)?;
        }
        Ok(cursor)
    }

    /// Hydrates one description node and returns the next realized sibling to look at.
    fn node(
        &mut self,
        node: &VNode,
        parent: NodeId,
        cursor: Option<NodeId>,
        text_follows: bool,
    ) -> Result<Option<NodeId>, ReconcileError> {
        if let VNode::Fragment(nodes) = node {
            return self.children(nodes, parent, cursor);
        }
        if let VNode::Text(text) = node
            && text.value().is_empty()
        {
            let id = self.doc.create_text("");
            self.doc.insert_before(parent, id, cursor)?;
            text.set_el(Some(id));
            self.report.synthesized += 1;
            return Ok(cursor);
        }
        let Some(existing) = cursor else {
            tracing::debug!(target: "brook::hydrate", %parent, "realized tree exhausted, mounting");
            mount(self.doc, node, parent, None)?;
            self.report.mounted += 1;
            return Ok(None);
        };
        let next = self.doc.next_sibling(existing);
        let adopted = match node {
            VNode::Text(text) => self.text(text, parent, existing, text_follows)?,
            VNode::Element(element) => self.element(element, existing)?,
            VNode::Fragment(_) => true,
        };
        if !adopted {
            tracing::warn!(
                target: "brook::hydrate",
                node = %existing,
                expected = ?describe(node),
                "hydration mismatch, replacing node"
            );
            mount(self.doc, node, parent, Some(existing))?;
            self.doc.destroy(existing)?;
            self.report.replaced += 1;
            return Ok(next);
        }
        Ok(self.doc.next_sibling(existing))
    }

    fn text(
        &mut self,
        text: &Text,
        parent: NodeId,
        existing: NodeId,
        text_follows: bool,
    ) -> Result<bool, ReconcileError> {
        let Some(content) = self.doc.text(existing) else {
            return Ok(false);
        };
        let claim = if content == text.value() {
            Claim::Exact
        } else if let Some(rest) = content.strip_prefix(text.value())
            && text_follows
        {
            Claim::Split(rest.into())
        } else {
            Claim::Repair
        };
        match claim {
            Claim::Exact => {}
            Claim::Split(rest) => {
                let remainder = self.doc.create_text(rest);
                let anchor = self.doc.next_sibling(existing);
                self.doc.set_text(existing, text.value())?;
                self.doc.insert_before(parent, remainder, anchor)?;
                self.report.synthesized += 1;
            }
            Claim::Repair => {
                tracing::debug!(
                    target: "brook::hydrate",
                    node = %existing,
                    "text content differs, correcting"
                );
                self.doc.set_text(existing, text.value())?;
                self.report.repaired += 1;
            }
        }
        text.set_el(Some(existing));
        self.report.adopted += 1;
        Ok(true)
    }

    fn element(&mut self, element: &Element, existing: NodeId) -> Result<bool, ReconcileError> {
        let matches = self
            .doc
            .tag(existing)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(element.tag()));
        if !matches {
            return Ok(false);
        }
        element.set_el(Some(existing));
        self.report.adopted += 1;
        for (key, value) in element.props() {
            if PropKind::of(key) == PropKind::Handler && value.as_handler().is_some() {
                apply_prop(self.doc, existing, key, None, Some(value))?;
                self.report.listeners += 1;
            }
        }
        if !element.is_preserved() {
            let cursor = self.doc.first_child(existing);
            self.children(element.child_nodes(), existing, cursor)?;
        }
        Ok(true)
    }
}

fn describe(node: &VNode) -> Vec<&str> {
    match node {
        VNode::Text(_) => alloc::vec!["#text"],
        VNode::Element(element) => alloc::vec![element.tag()],
        VNode::Fragment(nodes) => nodes.iter().flat_map(describe).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch_event;
    use alloc::rc::Rc;
    use brook_core::{Event, h};
    use core::cell::Cell;

    fn server_rendered(markup: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let container = doc.create_element("div");
        let root = doc.root();
        doc.append_child(root, container).expect("append");
        doc.parse_into(container, markup).expect("valid markup");
        (doc, container)
    }

    #[test]
    fn adopts_matching_output_without_replacing() {
        let (mut doc, container) =
            server_rendered(r#"<main class="page"><h1>Title</h1><p>Body <b>bold</b></p></main>"#);
        let main = doc.first_child(container).expect("main");
        let before = doc.mutation_count();

        let tree: VNode = h("main")
            .class("page")
            .child(h("h1").child("Title"))
            .child(h("p").child("Body ").child(h("b").child("bold")))
            .into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");

        assert!(report.is_clean());
        assert_eq!(report.adopted, 7);
        assert_eq!(doc.mutation_count(), before);
        assert_eq!(tree.el(), Some(main));
    }

    #[test]
    fn attaches_only_handlers() {
        let (mut doc, container) = server_rendered(r#"<button title="server">Go</button>"#);
        let clicks = Rc::new(Cell::new(0));
        let tree: VNode = h("button")
            .attr("title", "client")
            .on("click", {
                let clicks = clicks.clone();
                move |_: &Event| clicks.set(clicks.get() + 1)
            })
            .child("Go")
            .into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!(report.listeners, 1);

        let button = tree.el().expect("adopted");
        assert_eq!(doc.attribute(button, "title"), Some("server"));
        let doc = doc.shared();
        dispatch_event(&doc, button, Event::new("click"));
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn replaces_mismatched_elements_in_place() {
        let (mut doc, container) = server_rendered("<p>a</p><span>b</span><p>c</p>");
        let tree = VNode::fragment([
            VNode::from(h("p").child("a")),
            VNode::from(h("em").child("b")),
            VNode::from(h("p").child("c")),
        ]);
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!(report.replaced, 1);
        assert_eq!(doc.inner_html(container), "<p>a</p><em>b</em><p>c</p>");
    }

    #[test]
    fn text_against_element_is_replaced() {
        let (mut doc, container) = server_rendered("<i>x</i>");
        let tree = VNode::text("x");
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!(report.replaced, 1);
        assert_eq!(doc.inner_html(container), "x");
        assert_eq!(tree.el(), doc.first_child(container));
    }

    #[test]
    fn repairs_text_content() {
        let (mut doc, container) = server_rendered("<p>old</p>");
        let tree: VNode = h("p").child("new").into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!((report.repaired, report.replaced), (1, 0));
        assert_eq!(doc.inner_html(container), "<p>new</p>");
    }

    #[test]
    fn mounts_missing_nodes_and_keeps_extra_ones() {
        let (mut doc, container) = server_rendered("<ul><li>1</li></ul><footer>f</footer>");
        let list: VNode = h("ul")
            .child(h("li").child("1"))
            .child(h("li").child("2"))
            .into();
        let report = hydrate(&mut doc, &list, container).expect("hydrate");
        assert_eq!(report.mounted, 1);
        assert_eq!(
            doc.inner_html(container),
            "<ul><li>1</li><li>2</li></ul><footer>f</footer>"
        );
    }

    #[test]
    fn preserved_subtrees_are_not_walked() {
        let (mut doc, container) = server_rendered(r#"<nav preserve><a>Client</a></nav>"#);
        let tree: VNode = h("nav").preserve().child(h("a").child("Server")).into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!(report.adopted, 1);
        assert!(report.is_clean());
        assert_eq!(doc.inner_html(container), "<nav preserve><a>Client</a></nav>");
    }

    #[test]
    fn merged_adjacent_text_is_split() {
        let (mut doc, container) = server_rendered("<p>Count: 5</p>");
        let p = doc.first_child(container).expect("p");
        let tree: VNode = h("p").child("Count: ").child(5_i64).into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");

        assert!(report.is_clean());
        assert_eq!((report.adopted, report.synthesized), (3, 1));
        let texts: Vec<_> = doc
            .children(p)
            .iter()
            .map(|&node| doc.text(node).map(String::from))
            .collect();
        assert_eq!(
            texts,
            [Some(String::from("Count: ")), Some(String::from("5"))]
        );
        assert_eq!(tree.el(), Some(p));
    }

    #[test]
    fn trailing_text_mismatch_is_repaired_not_split() {
        let (mut doc, container) = server_rendered("<p>Count: 5</p>");
        let tree: VNode = h("p").child("Count: ").into();
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!((report.repaired, report.synthesized), (1, 0));
        assert_eq!(doc.inner_html(container), "<p>Count: </p>");
    }

    #[test]
    fn empty_text_consumes_no_server_node() {
        let (mut doc, container) = server_rendered("<p>x</p>");
        let p = doc.first_child(container).expect("p");
        let tree = VNode::fragment([VNode::text(""), VNode::from(h("p").child("x"))]);
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");

        assert!(report.is_clean());
        assert_eq!((report.adopted, report.synthesized), (2, 1));
        assert_eq!(tree.as_slice()[1].el(), Some(p));
        assert_eq!(doc.inner_html(container), "<p>x</p>");
    }

    #[test]
    fn empty_container_mounts_everything() {
        let (mut doc, container) = server_rendered("");
        let tree = VNode::fragment(["a", "b"]);
        let report = hydrate(&mut doc, &tree, container).expect("hydrate");
        assert_eq!(report.mounted, 2);
        assert_eq!(doc.text_content(container), "ab");
    }
}
