//! Server rendering for Brook.
//!
//! [`render_to_stream`] turns a description tree into a lazy sequence of escaped markup
//! fragments; nothing is rendered ahead of the consumer. [`render_page_stream`] wraps a page
//! component in a document shell whose head is produced before the component renders.
//!
//! ```rust
//! use brook_core::{VNode, h};
//! use brook_ssr::render_to_string;
//!
//! let node: VNode = h("p").attr("class", "note").child("1 < 2").into();
//! assert_eq!(render_to_string(&node), r#"<p class="note">1 &lt; 2</p>"#);
//! ```

extern crate alloc;

mod page;
mod script;
mod stream;

pub use page::{PageStream, RENDER_FAILURE_FRAGMENT, Shell, render_page, render_page_stream};
pub use script::script_json;
pub use stream::{RenderStream, render_to_stream, render_to_string};
