//! Tree model, render capability and configuration shared by every Brook backend.
//!
//! The reconciler and hydrator in `brook-dom` and the stream renderer in `brook-ssr` consume
//! the same [`VNode`] descriptions; components implement [`Render`] to produce them.

extern crate alloc;

pub mod config;
pub mod error;
pub mod escape;
pub mod event;
pub mod node;
pub mod prop;
pub mod schedule;
pub mod view;

#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use error::{ConfigError, ReconcileError, RenderError};
pub use escape::{escape_html, escape_into, unescape_html};
pub use event::{Event, Handler};
#[doc(inline)]
pub use node::{Element, NodeId, PropMap, Text, VNode, h, text};
pub use prop::{PropKind, PropValue, is_preserve_key, is_void_element};
pub use schedule::{IdleQueue, IdleScheduler, Task};
#[doc(inline)]
pub use view::{FnView, PageMeta, Render, Scope, from_fn};
