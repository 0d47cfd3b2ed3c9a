//! Pull-driven serialization of description trees.
//!
//! [`RenderStream`] is an explicit state machine: a stack of frames, each either the remaining
//! siblings at one depth or a pending closing tag. Every call to `next` advances the traversal
//! just far enough to produce one fragment, so a consumer that stops pulling stops the work.

use alloc::{
    format,
    string::String,
    vec::{self, Vec},
};
use core::{fmt, iter::FusedIterator};

use brook_core::{
    PropKind, PropMap, PropValue, VNode, escape_html, escape_into, is_void_element, prop,
};

enum Frame {
    Nodes(vec::IntoIter<VNode>),
    Close(String),
}

enum Step {
    Pop,
    Close,
    Node(VNode),
}

/// A lazy, finite, non-restartable sequence of markup fragments.
pub struct RenderStream {
    stack: Vec<Frame>,
}

impl fmt::Debug for RenderStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderStream")
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl RenderStream {
    /// Starts streaming `node`.
    #[must_use]
    pub fn new(node: VNode) -> Self {
        Self {
            stack: alloc::vec![Frame::Nodes(node.into_roots().into_iter())],
        }
    }

    /// Returns `true` once every fragment has been produced.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Iterator for RenderStream {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let step = match self.stack.last_mut()? {
                Frame::Nodes(nodes) => nodes.next().map_or(Step::Pop, Step::Node),
                Frame::Close(_) => Step::Close,
            };
            match step {
                Step::Pop => {
                    self.stack.pop();
                }
                Step::Close => {
                    if let Some(Frame::Close(tag)) = self.stack.pop() {
                        return Some(format!("</{tag}>"));
                    }
                }
                Step::Node(VNode::Fragment(nodes)) => {
                    self.stack.push(Frame::Nodes(nodes.into_iter()));
                }
                Step::Node(VNode::Text(text)) => {
                    if text.value().is_empty() {
                        continue;
                    }
                    return Some(escape_html(text.value()).into_owned());
                }
                Step::Node(VNode::Element(element)) => {
                    let (tag, props, children) = element.into_parts();
                    let open = open_tag(&tag, &props);
                    if !is_void_element(&tag) {
                        self.stack.push(Frame::Close(tag));
                        self.stack.push(Frame::Nodes(children.into_iter()));
                    }
                    return Some(open);
                }
            }
        }
    }
}

impl FusedIterator for RenderStream {}

fn open_tag(tag: &str, props: &PropMap) -> String {
    let mut out = String::with_capacity(tag.len() + 2);
    out.push('<');
    out.push_str(tag);
    for (key, value) in props {
        if prop::is_handler_key(key) {
            continue;
        }
        let name = match PropKind::of(key) {
            PropKind::Class => "class",
            _ => key.as_str(),
        };
        match value {
            PropValue::Bool(true) => {
                out.push(' ');
                out.push_str(name);
            }
            PropValue::Str(value) => {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(&mut out, value);
                out.push('"');
            }
            PropValue::Bool(false) | PropValue::Handler(_) => {}
        }
    }
    out.push('>');
    out
}

/// Streams a description tree as markup fragments.
pub fn render_to_stream(node: impl Into<VNode>) -> RenderStream {
    RenderStream::new(node.into())
}

/// Renders a description tree to a single string.
#[must_use]
pub fn render_to_string(node: &VNode) -> String {
    render_to_stream(node.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brook_core::{Event, h};

    #[test]
    fn escapes_text_content() {
        let node: VNode = h("div").child("<x>&\"'").into();
        assert_eq!(
            render_to_string(&node),
            "<div>&lt;x&gt;&amp;&quot;&#039;</div>"
        );
    }

    #[test]
    fn yields_one_fragment_per_step() {
        let node: VNode = h("ul")
            .child(h("li").child("a"))
            .child(h("li").child("b"))
            .into();
        let fragments: Vec<String> = render_to_stream(node).collect();
        assert_eq!(
            fragments,
            ["<ul>", "<li>", "a", "</li>", "<li>", "b", "</li>", "</ul>"]
        );
    }

    #[test]
    fn attributes_in_insertion_order() {
        let node: VNode = h("input")
            .attr("type", "checkbox")
            .attr("className", "toggle")
            .attr("checked", true)
            .attr("disabled", false)
            .attr("title", "say \"hi\"")
            .key("k1")
            .on("change", |_: &Event| {})
            .into();
        assert_eq!(
            render_to_string(&node),
            r#"<input type="checkbox" class="toggle" checked title="say &quot;hi&quot;">"#
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let node: VNode = h("p").child(h("br")).child(h("img").attr("src", "a.png")).into();
        assert_eq!(render_to_string(&node), r#"<p><br><img src="a.png"></p>"#);
    }

    #[test]
    fn empty_and_fragments() {
        assert_eq!(render_to_string(&VNode::empty()), "");
        assert_eq!(render_to_stream(VNode::empty()).next(), None);
        let node = VNode::Fragment(alloc::vec![
            VNode::text("a"),
            VNode::Fragment(alloc::vec![VNode::text("b"), VNode::empty()]),
            VNode::from(42),
        ]);
        assert_eq!(render_to_string(&node), "ab42");
    }

    #[test]
    fn stream_is_lazy_and_fused() {
        let items: Vec<VNode> = (0..1000).map(|i| h("li").child(i).into()).collect();
        let mut stream = render_to_stream(h("ul").children(items));
        assert_eq!(stream.next().as_deref(), Some("<ul>"));
        assert_eq!(stream.next().as_deref(), Some("<li>"));
        assert!(!stream.is_finished());
        let rest: Vec<String> = stream.by_ref().collect();
        assert_eq!(rest.last().map(String::as_str), Some("</ul>"));
        assert!(stream.is_finished());
        assert_eq!(stream.next(), None);
    }
}
