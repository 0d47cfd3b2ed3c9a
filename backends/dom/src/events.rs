//! Event dispatch over a shared document.

use alloc::vec::Vec;

use brook_core::{Event, Handler, NodeId};

use crate::document::SharedDocument;

/// Delivers `event` to the listeners of `target` and then of each ancestor.
///
/// Listeners are collected first and the document borrow is released before any of them
/// runs, so a handler may write reactive state that re-renders into the same document.
/// Returns the number of listeners invoked.
pub fn dispatch_event(doc: &SharedDocument, target: NodeId, event: Event) -> usize {
    let event = event.with_target(target);
    let handlers: Vec<Handler> = {
        let doc = doc.borrow();
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            path.extend(doc.listeners(node, event.name()));
            current = doc.parent(node);
        }
        path
    };
    tracing::trace!(
        target: "brook::dom",
        event = event.name(),
        node = %target,
        listeners = handlers.len(),
        "dispatching event"
    );
    for handler in &handlers {
        handler.call(&event);
    }
    handlers.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use alloc::{rc::Rc, string::String, vec};
    use core::cell::RefCell;

    #[test]
    fn bubbles_from_target_to_ancestors() {
        let doc = Document::new().shared();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (outer, inner) = {
            let mut doc = doc.borrow_mut();
            let outer = doc.create_element("div");
            let inner = doc.create_element("button");
            doc.append_child(outer, inner).expect("append");
            for (node, label) in [(outer, "outer"), (inner, "inner")] {
                let seen = seen.clone();
                doc.add_listener(
                    node,
                    "click",
                    Handler::new(move |event: &Event| {
                        seen.borrow_mut()
                            .push((label, event.target(), event.value().map(String::from)));
                    }),
                )
                .expect("listener");
            }
            (outer, inner)
        };

        let invoked = dispatch_event(&doc, inner, Event::new("click").with_value("v"));
        assert_eq!(invoked, 2);
        assert_eq!(
            *seen.borrow(),
            vec![
                ("inner", Some(inner), Some("v".into())),
                ("outer", Some(inner), Some("v".into())),
            ]
        );
        assert_eq!(dispatch_event(&doc, outer, Event::new("input")), 0);
    }

    #[test]
    fn handlers_may_mutate_the_document() {
        let doc = Document::new().shared();
        let button = {
            let mut guard = doc.borrow_mut();
            let button = guard.create_element("button");
            let root = guard.root();
            guard.append_child(root, button).expect("append");
            let shared = doc.clone();
            guard
                .add_listener(
                    button,
                    "click",
                    Handler::new(move |_: &Event| {
                        let mut doc = shared.borrow_mut();
                        let text = doc.create_text("clicked");
                        doc.append_child(button, text).expect("append");
                    }),
                )
                .expect("listener");
            button
        };
        dispatch_event(&doc, button, Event::new("click"));
        assert_eq!(doc.borrow().text_content(button), "clicked");
    }
}
