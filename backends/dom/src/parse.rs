//! Markup parsing into realized nodes.
//!
//! The parser understands the markup the stream renderer produces plus the common shapes a
//! hand-written page shell adds: doctype, comments, void and self-closing elements, quoted,
//! unquoted and bare attributes, and raw-text `script`/`style` bodies. It does not implement
//! the HTML tree-construction algorithm; mismatched end tags close back to the nearest open
//! element with the same tag and are ignored otherwise.

use alloc::{
    format,
    string::{String, ToString},
    vec,
    vec::Vec,
};

use brook_core::{NodeId, is_void_element, unescape_html};

use crate::{document::Document, error::DomError};

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
    self_closing: bool,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, reason: &str) -> DomError {
        DomError::Parse {
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_past(&mut self, terminator: &str, reason: &str) -> Result<(), DomError> {
        let end = self
            .rest()
            .find(terminator)
            .ok_or_else(|| self.error(reason))?;
        self.pos += end + terminator.len();
        Ok(())
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|ch: char| !keep(ch)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Length of the text run at the cursor. A `<` only ends the run when it starts a tag,
    /// an end tag, a comment or a doctype.
    fn text_len(&self) -> usize {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let mut offset = 0;
        while let Some(found) = rest[offset..].find('<') {
            let at = offset + found;
            match bytes.get(at + 1) {
                Some(next) if next.is_ascii_alphabetic() || *next == b'/' || *next == b'!' => {
                    return at;
                }
                _ => offset = at + 1,
            }
        }
        rest.len()
    }

    fn start_tag(&mut self) -> Result<StartTag, DomError> {
        self.pos += 1;
        let name = self
            .take_while(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == ':')
            .to_ascii_lowercase();
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: true,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(StartTag {
                    name,
                    attributes,
                    self_closing: false,
                });
            }
            if rest.is_empty() {
                return Err(self.error("unterminated start tag"));
            }

            let attribute = self
                .take_while(|ch| !ch.is_whitespace() && !matches!(ch, '=' | '>' | '/'))
                .to_ascii_lowercase();
            if attribute.is_empty() {
                return Err(self.error("unexpected character in start tag"));
            }
            self.skip_whitespace();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.attribute_value()?
            } else {
                String::new()
            };
            attributes.push((attribute, value));
        }
    }

    fn attribute_value(&mut self) -> Result<String, DomError> {
        let raw = match self.rest().chars().next() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let end = self
                    .rest()
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let raw = &self.rest()[..end];
                self.pos += end + 1;
                raw
            }
            _ => self.take_while(|ch| !ch.is_whitespace() && ch != '>'),
        };
        Ok(unescape_html(raw).into_owned())
    }

    fn end_tag(&mut self) -> Result<String, DomError> {
        self.pos += 2;
        let name = self
            .take_while(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == ':')
            .to_ascii_lowercase();
        self.skip_past(">", "unterminated end tag")?;
        Ok(name)
    }

    /// Consumes a raw-text body up to and including its end tag.
    fn raw_text(&mut self, tag: &str) -> Result<&'a str, DomError> {
        let rest = self.rest();
        let close = format!("</{tag}");
        let end = rest
            .to_ascii_lowercase()
            .find(&close)
            .ok_or_else(|| self.error("unterminated raw text element"))?;
        self.pos += end;
        self.end_tag()?;
        Ok(&rest[..end])
    }
}

impl Document {
    /// Parses `markup` and appends the resulting nodes to `container`.
    ///
    /// Returns the top-level nodes that were appended.
    ///
    /// # Errors
    ///
    /// Fails when `container` is not an element or the markup has an unterminated tag,
    /// comment or attribute value. Nodes parsed before the failure stay in place.
    pub fn parse_into(&mut self, container: NodeId, markup: &str) -> Result<Vec<NodeId>, DomError> {
        self.element(container)?;
        let mut parser = Parser {
            input: markup,
            pos: 0,
        };
        let mut open = vec![container];
        let mut roots = Vec::new();

        while parser.pos < markup.len() {
            let parent = open.last().copied().unwrap_or(container);
            let rest = parser.rest();

            if rest.starts_with("<!--") {
                parser.skip_past("-->", "unterminated comment")?;
            } else if rest.starts_with("<!") {
                parser.skip_past(">", "unterminated declaration")?;
            } else if rest.starts_with("</") {
                let name = parser.end_tag()?;
                if let Some(depth) = open
                    .iter()
                    .skip(1)
                    .rposition(|&node| self.tag(node) == Some(name.as_str()))
                {
                    open.truncate(depth + 1);
                }
            } else if parser.text_len() == 0 {
                let tag = parser.start_tag()?;
                let element = self.create_element(tag.name.clone());
                for (name, value) in tag.attributes {
                    self.set_attribute(element, name, value)?;
                }
                self.append_child(parent, element)?;
                if parent == container {
                    roots.push(element);
                }
                if tag.self_closing || is_void_element(&tag.name) {
                    continue;
                }
                if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                    let body = parser.raw_text(&tag.name)?;
                    if !body.is_empty() {
                        let text = self.create_text(body);
                        self.append_child(element, text)?;
                    }
                } else {
                    open.push(element);
                }
            } else {
                let len = parser.text_len();
                let text = self.create_text(unescape_html(&rest[..len]).into_owned());
                parser.pos += len;
                self.append_child(parent, text)?;
                if parent == container {
                    roots.push(text);
                }
            }
        }
        Ok(roots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(markup: &str) -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new();
        let root = doc.root();
        let roots = doc.parse_into(root, markup).expect("valid markup");
        (doc, root, roots)
    }

    #[test]
    fn elements_attributes_and_text() {
        let (doc, _, roots) =
            parse(r#"<div class="card" id=main hidden><p>Hi &amp; bye</p>tail</div>"#);
        assert_eq!(roots.len(), 1);
        let div = roots[0];
        assert_eq!(doc.tag(div), Some("div"));
        assert_eq!(doc.attribute(div, "class"), Some("card"));
        assert_eq!(doc.attribute(div, "id"), Some("main"));
        assert_eq!(doc.attribute(div, "hidden"), Some(""));
        let [p, tail] = doc.children(div) else {
            panic!("expected two children");
        };
        assert_eq!(doc.text_content(*p), "Hi & bye");
        assert_eq!(doc.text(*tail), Some("tail"));
    }

    #[test]
    fn decodes_the_escapes() {
        let (doc, _, roots) = parse("<p title=\"&quot;q&#039;\">&lt;x&gt;&amp;&quot;&#039;</p>");
        assert_eq!(doc.attribute(roots[0], "title"), Some("\"q'"));
        assert_eq!(doc.text_content(roots[0]), "<x>&\"'");
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let (doc, _, roots) = parse(r#"<p>a<br>b<img src="x.png"/>c</p>"#);
        let children = doc.children(roots[0]);
        assert_eq!(children.len(), 5);
        assert_eq!(doc.tag(children[1]), Some("br"));
        assert!(!doc.has_child_nodes(children[1]));
        assert_eq!(doc.text(children[4]), Some("c"));
    }

    #[test]
    fn skips_doctype_and_comments() {
        let (doc, root, roots) = parse("<!DOCTYPE html><!-- shell --><main></main>");
        assert_eq!(roots.len(), 1);
        assert_eq!(doc.children(root), roots.as_slice());
    }

    #[test]
    fn raw_text_is_kept_verbatim() {
        let (doc, _, roots) = parse("<script>if (a < b && c) {}</script><p>x</p>");
        assert_eq!(roots.len(), 2);
        assert_eq!(doc.text_content(roots[0]), "if (a < b && c) {}");
    }

    #[test]
    fn stray_less_than_is_text() {
        let (doc, root, _) = parse("1 < 2");
        assert_eq!(doc.text_content(root), "1 < 2");
    }

    #[test]
    fn unclosed_elements_close_at_the_end() {
        let (doc, _, roots) = parse("<ul><li>one<li>two</ul><p>after");
        assert_eq!(roots.len(), 2);
        assert_eq!(doc.text_content(roots[1]), "after");
    }

    #[test]
    fn reports_unterminated_tags() {
        let mut doc = Document::new();
        let root = doc.root();
        assert!(matches!(
            doc.parse_into(root, r#"<div class="x"#),
            Err(DomError::Parse { .. })
        ));
    }
}
