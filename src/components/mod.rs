//! Built-in components.

mod lazy;
mod smart_image;

pub use lazy::{Lazy, Loader};
pub use smart_image::{SmartImage, retry_url};
