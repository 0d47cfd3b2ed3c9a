#![doc = include_str!("../README.md")]
#![allow(clippy::multiple_crate_versions)]

extern crate alloc;

pub mod component;
pub mod components;
mod error;
pub mod logging;
pub mod store;


#[doc(inline)]
pub use component::{Component, Container, fallback_node};
pub use components::{Lazy, SmartImage};
pub use error::Error;
#[doc(inline)]
pub use store::{Action, Store, Subscription};

pub use tracing as log;

#[doc(inline)]
pub use brook_core::{
    Config, Element, Event, FnView, Handler, IdleQueue, IdleScheduler, NodeId, PageMeta,
    ReconcileError, Render, RenderError, Scope, VNode, escape_html, from_fn, h, text,
};
pub use brook_dom as dom;
pub use brook_reactive as reactive;
pub use brook_reactive::{Map, State, Value, json};
pub use brook_ssr as ssr;
#[doc(inline)]
pub use brook_ssr::{Shell, render_page, render_page_stream, render_to_stream, render_to_string};

pub mod prelude {
    //! The types most applications need, for glob import.
    //!
    //! ```rust
    //! use brook::prelude::*;
    //!
    //! let view = from_fn(|scope| Ok(h("p").child(scope.prop_str("name").unwrap_or("world")).into()));
    //! let html = render_to_string(&view.render(&Scope::new(
    //!     &Map::new(),
    //!     &State::new(),
    //!     &Config::default(),
    //!     None,
    //! ))?);
    //! assert_eq!(html, "<p>world</p>");
    //! # Ok::<(), RenderError>(())
    //! ```
    pub use super::{
        Component, Config, Container, Event, Map, Render, RenderError, Scope, State, Store,
        VNode, Value, from_fn, h, json, render_page_stream, render_to_string, text,
    };
}
