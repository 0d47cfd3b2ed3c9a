//! Host events and the handlers attached to them.

use alloc::{rc::Rc, string::String};
use core::fmt;

use crate::node::NodeId;

/// An event delivered by the host tree to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    target: Option<NodeId>,
    value: Option<String>,
}

impl Event {
    /// Creates an event with the given lower-case name (`click`, `input`, ...).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            value: None,
        }
    }

    /// Attaches the payload carried by input-like events.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the realized node the event was dispatched on.
    #[must_use]
    pub const fn with_target(mut self, target: NodeId) -> Self {
        self.target = Some(target);
        self
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the realized node the event was dispatched on.
    #[must_use]
    pub const fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Returns the payload, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// An opaque, shareable event callback.
///
/// Two handlers are equal only if they share the same allocation, so re-rendering with a fresh
/// closure counts as a change while passing the same `Handler` through does not.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&Event)>);

impl Handler {
    /// Wraps a callback.
    pub fn new(f: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` when both handlers share the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

impl<F: Fn(&Event) + 'static> From<F> for Handler {
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn handler_equality_is_identity() {
        let a = Handler::new(|_| {});
        let b = Handler::new(|_| {});
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn handler_receives_event_payload() {
        let seen = Rc::new(Cell::new(false));
        let handler = Handler::new({
            let seen = seen.clone();
            move |event: &Event| seen.set(event.value() == Some("hi"))
        });
        handler.call(&Event::new("input").with_value("hi"));
        assert!(seen.get());
    }
}
