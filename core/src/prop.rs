//! Element properties and how the host interprets them.

use alloc::string::{String, ToString};

use crate::event::Handler;

/// Value stored under an element property key.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// A string attribute or live property value.
    Str(String),
    /// A boolean attribute; `false` means absent.
    Bool(bool),
    /// An event callback, stored under an `on*` key.
    Handler(Handler),
}

impl PropValue {
    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the handler, if this is a handler.
    #[must_use]
    pub const fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(handler) => Some(handler),
            _ => None,
        }
    }

    /// Returns `true` for values that mean "attribute absent".
    #[must_use]
    pub const fn is_falsy(&self) -> bool {
        matches!(self, Self::Bool(false))
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for PropValue {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Handler> for PropValue {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

macro_rules! impl_numeric_prop {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for PropValue {
                fn from(value: $ty) -> Self {
                    Self::Str(value.to_string())
                }
            }
        )*
    };
}

impl_numeric_prop!(i32, i64, u32, u64, usize, f32, f64);

/// How a property key is applied to a realized element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    /// `on*` keys attach and detach event listeners.
    Handler,
    /// `value` and `checked` set live element state instead of an attribute.
    Live,
    /// `class` / `className` map onto the `class` attribute.
    Class,
    /// Everything else is a generic attribute.
    Attribute,
}

impl PropKind {
    /// Classifies a property key by name.
    #[must_use]
    pub fn of(key: &str) -> Self {
        match key {
            "value" | "checked" => Self::Live,
            "class" | "className" => Self::Class,
            _ if is_handler_key(key) => Self::Handler,
            _ => Self::Attribute,
        }
    }
}

/// Returns `true` for handler-like keys (`on` followed by an event name).
#[must_use]
pub fn is_handler_key(key: &str) -> bool {
    key.len() > 2 && key.starts_with("on")
}

/// Returns the lower-case event name of a handler key (`onClick` -> `click`).
#[must_use]
pub fn event_name(key: &str) -> Option<String> {
    is_handler_key(key).then(|| key[2..].to_ascii_lowercase())
}

/// Property keys that protect an element's children from reconciliation and hydration.
pub const PRESERVE_KEYS: [&str; 2] = ["preserve", "z-preserve"];

/// Returns `true` if `key` is a preserve marker.
#[must_use]
pub fn is_preserve_key(key: &str) -> bool {
    PRESERVE_KEYS.contains(&key)
}

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Returns `true` for void elements, ignoring ASCII case.
#[must_use]
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_keys() {
        assert_eq!(PropKind::of("onClick"), PropKind::Handler);
        assert_eq!(PropKind::of("oninput"), PropKind::Handler);
        assert_eq!(PropKind::of("on"), PropKind::Attribute);
        assert_eq!(PropKind::of("value"), PropKind::Live);
        assert_eq!(PropKind::of("checked"), PropKind::Live);
        assert_eq!(PropKind::of("className"), PropKind::Class);
        assert_eq!(PropKind::of("href"), PropKind::Attribute);
    }

    #[test]
    fn event_names_are_lowercased() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onmouseenter").as_deref(), Some("mouseenter"));
        assert_eq!(event_name("title"), None);
    }

    #[test]
    fn void_elements_ignore_case() {
        assert!(is_void_element("img"));
        assert!(is_void_element("BR"));
        assert!(!is_void_element("div"));
    }

    #[test]
    fn falsy_values() {
        assert!(PropValue::Bool(false).is_falsy());
        assert!(!PropValue::Bool(true).is_falsy());
        assert!(!PropValue::from("").is_falsy());
        assert_eq!(PropValue::from(3), PropValue::Str("3".into()));
    }
}
