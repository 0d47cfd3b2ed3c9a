//! Serializing realized nodes back to markup.

use alloc::string::String;

use brook_core::{NodeId, escape_into, is_void_element};

use crate::document::{Document, NodeData};

impl Document {
    /// Serializes a node and its subtree.
    ///
    /// Attributes with an empty value are written bare, matching how the stream renderer
    /// writes boolean attributes.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id, false);
        out
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag(id).is_some_and(is_raw_text);
        for &child in self.children(id) {
            self.write_node(&mut out, child, raw);
        }
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, raw: bool) {
        match self.node(id) {
            Some(NodeData::Text(value)) if raw => out.push_str(value),
            Some(NodeData::Text(value)) => escape_into(out, value),
            Some(NodeData::Element(element)) => {
                out.push('<');
                out.push_str(element.tag());
                for (name, value) in element.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        escape_into(out, value);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(element.tag()) {
                    return;
                }
                let raw = is_raw_text(element.tag());
                for &child in self.children(id) {
                    self.write_node(out, child, raw);
                }
                out.push_str("</");
                out.push_str(element.tag());
                out.push('>');
            }
            None => {}
        }
    }
}

fn is_raw_text(tag: &str) -> bool {
    tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_what_it_parses() {
        let markup = r#"<div class="a&amp;b" hidden><p>&lt;x&gt;</p><br><input value="1"></div>"#;
        let mut doc = Document::new();
        let root = doc.root();
        doc.parse_into(root, markup).expect("valid markup");
        assert_eq!(doc.inner_html(root), markup);
    }

    #[test]
    fn script_bodies_are_not_escaped() {
        let mut doc = Document::new();
        let root = doc.root();
        let roots = doc
            .parse_into(root, "<script>a && b</script>")
            .expect("valid markup");
        assert_eq!(doc.outer_html(roots[0]), "<script>a && b</script>");
        assert_eq!(doc.inner_html(roots[0]), "a && b");
    }
}
