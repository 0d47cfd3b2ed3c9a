//! A small selector engine backing child lookups.
//!
//! Supported: type selectors, `*`, `#id`, `.class`, `[attr]`, `[attr=value]` (value quoted or
//! bare), compounds of those such as `button.primary[disabled]`, and the descendant
//! combinator (whitespace).

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::str::FromStr;

use brook_core::NodeId;

use crate::{
    document::{Document, ElementData},
    error::DomError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, element: &ElementData) -> bool {
        self.tag
            .as_deref()
            .is_none_or(|tag| element.tag().eq_ignore_ascii_case(tag))
            && self
                .id
                .as_deref()
                .is_none_or(|id| element.attribute("id") == Some(id))
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attributes.iter().all(|(name, value)| {
                match (element.attribute(name), value.as_deref()) {
                    (Some(actual), Some(expected)) => actual == expected,
                    (found, None) => found.is_some(),
                    (None, Some(_)) => false,
                }
            })
    }
}

/// A parsed selector: compounds joined by descendant combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    chain: Vec<Compound>,
}

fn is_ident(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input.find(|ch: char| !is_ident(ch)).unwrap_or(input.len());
    input.split_at(end)
}

fn parse_compound(source: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let mut rest = source;
    if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    } else {
        let (tag, after) = take_ident(rest);
        if !tag.is_empty() {
            compound.tag = Some(tag.to_ascii_lowercase());
            rest = after;
        }
    }
    while let Some(marker) = rest.chars().next() {
        rest = &rest[marker.len_utf8()..];
        match marker {
            '#' | '.' => {
                let (name, after) = take_ident(rest);
                if name.is_empty() {
                    return None;
                }
                if marker == '#' {
                    compound.id = Some(name.to_string());
                } else {
                    compound.classes.push(name.to_string());
                }
                rest = after;
            }
            '[' => {
                let end = rest.find(']')?;
                let body = &rest[..end];
                rest = &rest[end + 1..];
                let attribute = match body.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim().trim_matches(['"', '\'']);
                        (name.trim().to_ascii_lowercase(), Some(value.to_string()))
                    }
                    None => (body.trim().to_ascii_lowercase(), None),
                };
                if attribute.0.is_empty() {
                    return None;
                }
                compound.attributes.push(attribute);
            }
            _ => return None,
        }
    }
    Some(compound)
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let chain = source
            .split_ascii_whitespace()
            .map(parse_compound)
            .collect::<Option<Vec<_>>>()
            .filter(|chain| !chain.is_empty())
            .ok_or_else(|| DomError::InvalidSelector(source.to_string()))?;
        Ok(Self { chain })
    }
}

impl Selector {
    /// Returns `true` if `node` matches, considering only ancestors below `scope`.
    #[must_use]
    pub fn matches(&self, doc: &Document, node: NodeId, scope: NodeId) -> bool {
        let Some((last, ancestors)) = self.chain.split_last() else {
            return false;
        };
        if !doc.element(node).is_ok_and(|element| last.matches(element)) {
            return false;
        }
        let mut current = doc.parent(node);
        for compound in ancestors.iter().rev() {
            loop {
                match current {
                    Some(id) if id != scope => {
                        current = doc.parent(id);
                        if doc.element(id).is_ok_and(|element| compound.matches(element)) {
                            break;
                        }
                    }
                    _ => return false,
                }
            }
        }
        true
    }
}

impl Document {
    /// Returns the first descendant of `root`, in document order, that matches `selector`.
    ///
    /// # Errors
    ///
    /// Fails if the selector cannot be parsed.
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let selector: Selector = selector.parse()?;
        Ok(self
            .descendants(root)
            .into_iter()
            .find(|&node| selector.matches(self, node, root)))
    }

    /// Returns every descendant of `root` that matches `selector`, in document order.
    ///
    /// # Errors
    ///
    /// Fails if the selector cannot be parsed.
    pub fn query_selector_all(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        let selector: Selector = selector.parse()?;
        Ok(self
            .descendants(root)
            .into_iter()
            .filter(|&node| selector.matches(self, node, root))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        doc.parse_into(
            root,
            r#"<main id="main"><div class="card wide"><a href="/a" data-x="1">A</a></div><ul class="list"><li class="item">one</li><li class="item active">two</li></ul></main>"#,
        )
        .expect("valid markup");
        (doc, root)
    }

    fn text_of(doc: &Document, node: Option<NodeId>) -> String {
        node.map(|node| doc.text_content(node)).unwrap_or_default()
    }

    #[test]
    fn simple_selectors() {
        let (doc, root) = page();
        assert_eq!(text_of(&doc, doc.query_selector(root, "a").unwrap()), "A");
        assert_eq!(text_of(&doc, doc.query_selector(root, ".active").unwrap()), "two");
        assert!(doc.query_selector(root, "#main").unwrap().is_some());
        assert!(doc.query_selector(root, "table").unwrap().is_none());
    }

    #[test]
    fn compound_and_attribute_selectors() {
        let (doc, root) = page();
        assert!(doc.query_selector(root, "div.card.wide").unwrap().is_some());
        assert!(doc.query_selector(root, "div.card.narrow").unwrap().is_none());
        assert!(doc.query_selector(root, "a[href]").unwrap().is_some());
        assert!(doc.query_selector(root, r#"a[data-x="1"]"#).unwrap().is_some());
        assert!(doc.query_selector(root, "a[data-x=2]").unwrap().is_none());
    }

    #[test]
    fn descendant_combinator_and_all() {
        let (doc, root) = page();
        assert_eq!(doc.query_selector_all(root, "ul li").unwrap().len(), 2);
        assert_eq!(doc.query_selector_all(root, "main .item").unwrap().len(), 2);
        assert!(doc.query_selector(root, "div li").unwrap().is_none());
    }

    #[test]
    fn search_is_scoped_to_descendants() {
        let (doc, root) = page();
        let list = doc.query_selector(root, "ul").unwrap().expect("list");
        assert!(doc.query_selector(list, "ul").unwrap().is_none());
        assert!(doc.query_selector(list, "main li").unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_selectors() {
        let (doc, root) = page();
        assert!(matches!(
            doc.query_selector(root, "div > p"),
            Err(DomError::InvalidSelector(_))
        ));
        assert!(doc.query_selector(root, "  ").is_err());
        assert!(doc.query_selector(root, "a[").is_err());
    }
}
