//! In-memory host tree for Brook, with the reconciler and hydrator that drive it.
//!
//! The [`Document`] plays the role a browser DOM plays for a web client: the reconciler
//! creates, moves and destroys its nodes, the hydrator adopts nodes parsed from server
//! markup, and [`dispatch_event`] delivers events to the handlers attached along the way.
//!
//! ```rust
//! use brook_core::{VNode, h};
//! use brook_dom::{Document, mount, patch};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let old: VNode = h("p").child("Hello").into();
//! mount(&mut doc, &old, root, None).unwrap();
//!
//! let new: VNode = h("p").child("World").into();
//! patch(&mut doc, &old, &new, root).unwrap();
//! assert_eq!(doc.inner_html(root), "<p>World</p>");
//! ```

extern crate alloc;

mod document;
mod error;
mod events;
mod html;
mod hydrate;
mod parse;
mod reconcile;
mod selector;

pub use document::{Document, ElementData, NodeData, SharedDocument};
pub use error::DomError;
pub use events::dispatch_event;
pub use hydrate::{HydrationReport, hydrate};
pub use reconcile::{apply_prop, diff_children, mount, patch, unmount};
pub use selector::Selector;
