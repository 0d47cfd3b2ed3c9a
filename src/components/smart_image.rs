//! An image with a loading placeholder, retries and a fallback.

use alloc::{
    boxed::Box,
    format,
    rc::Rc,
    string::{String, ToString},
};

use brook_core::{Element, Event, IdleScheduler, Render, RenderError, Scope, VNode, h};
use brook_reactive::{Map, State, Value};

const LOADED: &str = "loaded";
const ERROR: &str = "error";
const RETRY_COUNT: &str = "retryCount";
const CURRENT_SRC: &str = "currentSrc";

/// Renders an `<img>` that degrades gracefully when the `smart_image` flag is on.
///
/// Props: `src` (required), `alt`, `class`, `width`, `height`, `placeholder` (a low-quality
/// image shown until the real one loads) and `fallback` (shown after the retries are spent).
/// With the flag off the component renders a plain `<img>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartImage;

impl SmartImage {
    /// Failed loads retried before the fallback is shown.
    pub const MAX_RETRIES: u32 = 2;

    /// Creates the component.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Appends the cache-busting retry marker to `src`.
#[must_use]
pub fn retry_url(src: &str, attempt: u32) -> String {
    let separator = if src.contains('?') { '&' } else { '?' };
    format!("{src}{separator}brook_retry={attempt}")
}

fn prop_text(scope: &Scope<'_>, name: &str) -> Option<String> {
    match scope.prop(name)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn decorated(mut img: Element, alt: Option<&str>, class: &str) -> Element {
    if let Some(alt) = alt {
        img = img.attr("alt", alt);
    }
    if !class.is_empty() {
        img = img.class(class);
    }
    img
}

fn sized(mut img: Element, width: Option<&str>, height: Option<&str>) -> Element {
    if let Some(width) = width {
        img = img.attr("width", width);
    }
    if let Some(height) = height {
        img = img.attr("height", height);
    }
    img
}

fn on_error(
    state: State,
    src: String,
    scheduler: Option<Rc<dyn IdleScheduler>>,
) -> impl Fn(&Event) + 'static {
    move |_: &Event| {
        let attempt = state.get_or(RETRY_COUNT, 0_u32);
        if attempt >= SmartImage::MAX_RETRIES {
            tracing::warn!(target: "brook", src = %src, "image failed after retries");
            state.set(ERROR, true);
            return;
        }
        let next = attempt + 1;
        let retry = {
            let (state, url) = (state.clone(), retry_url(&src, next));
            move || {
                state.set(RETRY_COUNT, next);
                state.set(CURRENT_SRC, url);
            }
        };
        tracing::debug!(target: "brook", src = %src, attempt = next, "retrying image");
        match &scheduler {
            Some(scheduler) => scheduler.request_idle(Box::new(retry)),
            None => retry(),
        }
    }
}

impl Render for SmartImage {
    fn render(&self, scope: &Scope<'_>) -> Result<VNode, RenderError> {
        let src = scope
            .require("src")?
            .as_str()
            .ok_or_else(|| RenderError::failed("prop `src` must be a string"))?;
        let alt = scope.prop_str("alt");
        let class = scope.prop_str("class").unwrap_or_default();
        let width = prop_text(scope, "width");
        let height = prop_text(scope, "height");

        if !scope.config().smart_image {
            let img = decorated(h("img").attr("src", src), alt, class);
            return Ok(sized(img, width.as_deref(), height.as_deref()).into());
        }

        let state = scope.state();
        if state.get_or(ERROR, false) {
            if let Some(fallback) = scope.prop_str("fallback") {
                let img = decorated(h("img").attr("src", fallback), alt, class);
                return Ok(sized(img, width.as_deref(), height.as_deref()).into());
            }
            let style = format!(
                "min-height: {}; width: {};",
                height.as_deref().unwrap_or("100px"),
                width.as_deref().unwrap_or("100%"),
            );
            return Ok(h("div")
                .class(format!("{class} brook-image-fallback").trim().to_string())
                .attr("role", "img")
                .attr("aria-label", alt.unwrap_or_default())
                .attr("style", style)
                .into());
        }

        let loaded = state.get_or(LOADED, false);
        let current = state
            .get_as::<String>(CURRENT_SRC)
            .unwrap_or_else(|| src.to_string());
        let style = format!(
            "display: inline-block; min-height: {}; width: {};",
            height.as_deref().map_or_else(|| "auto".into(), |value| format!("{value}px")),
            width.as_deref().map_or_else(|| "auto".into(), |value| format!("{value}px")),
        );

        let placeholder: VNode = if loaded {
            VNode::empty()
        } else if let Some(placeholder) = scope.prop_str("placeholder") {
            h("img")
                .class("brook-image-placeholder")
                .attr("src", placeholder)
                .attr("alt", "")
                .into()
        } else {
            h("div").class("brook-image-skeleton").into()
        };

        let on_load = {
            let state = state.clone();
            move |_: &Event| {
                state.set(LOADED, true);
            }
        };
        let img = h("img")
            .attr("src", current)
            .attr("alt", alt.unwrap_or_default())
            .class(if loaded {
                "brook-image is-loaded"
            } else {
                "brook-image is-loading"
            })
            .on("load", on_load)
            .on(
                "error",
                on_error(state.clone(), src.to_string(), scope.scheduler().cloned()),
            );

        Ok(h("div")
            .class(format!("brook-image-frame {class}").trim().to_string())
            .attr("style", style)
            .child(placeholder)
            .child(sized(img, width.as_deref(), height.as_deref()))
            .into())
    }

    fn initial_state(&self, props: &Map<String, Value>) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert(LOADED.into(), Value::Bool(false));
        state.insert(ERROR.into(), Value::Bool(false));
        state.insert(RETRY_COUNT.into(), Value::from(0));
        if let Some(src) = props.get("src") {
            state.insert(CURRENT_SRC.into(), src.clone());
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, Container};
    use brook_core::{Config, IdleQueue};
    use brook_dom::{Document, dispatch_event};
    use brook_reactive::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn html(container: &Container) -> String {
        container.doc().borrow().inner_html(container.node())
    }

    fn main_image(component: &Component) -> brook_core::NodeId {
        component
            .query("img.brook-image")
            .expect("valid selector")
            .expect("image rendered")
    }

    #[test]
    fn plain_image_when_the_flag_is_off() {
        let container = Container::root(Document::new().shared());
        let component = Component::new(
            SmartImage::new(),
            props(json!({ "src": "/cat.png", "alt": "Cat", "width": 64 })),
        );
        component.mount(container.clone()).expect("mount");
        assert_eq!(
            html(&container),
            r#"<img src="/cat.png" alt="Cat" width="64">"#
        );
    }

    #[test]
    fn missing_src_is_a_render_error() {
        let component = Component::new(SmartImage::new(), Map::new());
        let result = component.mount(Container::root(Document::new().shared()));
        assert_eq!(
            result,
            Err(crate::Error::Render(RenderError::MissingProp("src".into())))
        );
    }

    #[test]
    fn placeholder_until_loaded() {
        let container = Container::root(Document::new().shared());
        let component = Component::new(
            SmartImage::new(),
            props(json!({ "src": "/cat.png", "placeholder": "/cat-tiny.png" })),
        )
        .with_config(Config::new().with_smart_image(true));
        component.mount(container.clone()).expect("mount");
        assert!(html(&container).contains("brook-image-placeholder"));

        let img = main_image(&component);
        dispatch_event(container.doc(), img, Event::new("load"));
        assert!(!html(&container).contains("brook-image-placeholder"));
        assert!(html(&container).contains("is-loaded"));
    }

    #[test]
    fn retries_then_falls_back() {
        let container = Container::root(Document::new().shared());
        let queue = IdleQueue::new();
        let component = Component::new(
            SmartImage::new(),
            props(json!({ "src": "/cat.png?size=2", "fallback": "/missing.png" })),
        )
        .with_config(Config::new().with_smart_image(true))
        .with_scheduler(Rc::new(queue.clone()));
        component.mount(container.clone()).expect("mount");

        for attempt in 1..=SmartImage::MAX_RETRIES {
            let img = main_image(&component);
            dispatch_event(container.doc(), img, Event::new("error"));
            queue.run_until_idle();
            let img = main_image(&component);
            let src = container.doc().borrow().attribute(img, "src").map(String::from);
            assert_eq!(src, Some(retry_url("/cat.png?size=2", attempt)));
        }

        let img = main_image(&component);
        dispatch_event(container.doc(), img, Event::new("error"));
        assert_eq!(html(&container), r#"<img src="/missing.png">"#);
    }

    #[test]
    fn retry_urls() {
        assert_eq!(retry_url("/a.png", 1), "/a.png?brook_retry=1");
        assert_eq!(retry_url("/a.png?v=3", 2), "/a.png?v=3&brook_retry=2");
    }
}
