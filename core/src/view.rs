//! The render capability implemented by every component.
//!
//! A component is a value implementing [`Render`]. The component shell owns its props and
//! reactive state and hands them to the render step through a [`Scope`]; lifecycle hooks are
//! optional trait methods with empty defaults.

use alloc::{boxed::Box, rc::Rc, string::String};
use core::fmt;

use brook_reactive::{Map, State, Value};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::RenderError,
    node::VNode,
    schedule::{IdleScheduler, Task},
};

/// Page metadata consumed by the document shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    /// Document title.
    pub title: Option<String>,
    /// Meta description.
    pub description: Option<String>,
    /// Preview image used by social cards.
    pub image: Option<String>,
}

impl PageMeta {
    /// Title used when a page does not set one.
    pub const DEFAULT_TITLE: &'static str = "Brook App";
    /// Description used when a page does not set one.
    pub const DEFAULT_DESCRIPTION: &'static str = "Built with brook";
    /// Image used when a page does not set one.
    pub const DEFAULT_IMAGE: &'static str = "/brook.png";

    /// Creates metadata with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the preview image.
    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// The title, or [`PageMeta::DEFAULT_TITLE`].
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::DEFAULT_TITLE)
    }

    /// The description, or [`PageMeta::DEFAULT_DESCRIPTION`].
    #[must_use]
    pub fn description_or_default(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or(Self::DEFAULT_DESCRIPTION)
    }

    /// The image, or [`PageMeta::DEFAULT_IMAGE`].
    #[must_use]
    pub fn image_or_default(&self) -> &str {
        self.image.as_deref().unwrap_or(Self::DEFAULT_IMAGE)
    }
}

/// Everything a render step or lifecycle hook can see.
pub struct Scope<'a> {
    props: &'a Map<String, Value>,
    state: &'a State,
    config: &'a Config,
    scheduler: Option<&'a Rc<dyn IdleScheduler>>,
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("props", self.props)
            .field("state", self.state)
            .field("config", self.config)
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

impl<'a> Scope<'a> {
    /// Creates a scope over borrowed component data.
    #[must_use]
    pub const fn new(
        props: &'a Map<String, Value>,
        state: &'a State,
        config: &'a Config,
        scheduler: Option<&'a Rc<dyn IdleScheduler>>,
    ) -> Self {
        Self {
            props,
            state,
            config,
            scheduler,
        }
    }

    /// The component's props.
    #[must_use]
    pub const fn props(&self) -> &'a Map<String, Value> {
        self.props
    }

    /// Returns a prop by name.
    #[must_use]
    pub fn prop(&self, name: &str) -> Option<&'a Value> {
        self.props.get(name)
    }

    /// Returns a string prop by name.
    #[must_use]
    pub fn prop_str(&self, name: &str) -> Option<&'a str> {
        self.props.get(name).and_then(Value::as_str)
    }

    /// Returns a prop the component cannot render without.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingProp`] when the prop is absent or `null`.
    pub fn require(&self, name: &str) -> Result<&'a Value, RenderError> {
        match self.props.get(name) {
            Some(Value::Null) | None => Err(RenderError::MissingProp(name.into())),
            Some(value) => Ok(value),
        }
    }

    /// Deserializes a prop.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingProp`] when absent and [`RenderError::Failed`] when the
    /// value has the wrong shape.
    pub fn prop_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, RenderError> {
        let value = self.require(name)?;
        T::deserialize(value)
            .map_err(|err| RenderError::Failed(alloc::format!("prop `{name}`: {err}")))
    }

    /// The component's reactive state. Reads inside `render` are tracked.
    #[must_use]
    pub const fn state(&self) -> &'a State {
        self.state
    }

    /// The configuration the component was mounted with.
    #[must_use]
    pub const fn config(&self) -> &'a Config {
        self.config
    }

    /// The host's idle scheduler, if the component has one.
    #[must_use]
    pub const fn scheduler(&self) -> Option<&'a Rc<dyn IdleScheduler>> {
        self.scheduler
    }

    /// Hands `task` to the host's idle scheduler.
    ///
    /// Returns `false` and drops the task when the component has no scheduler.
    pub fn schedule(&self, task: impl FnOnce() + 'static) -> bool {
        self.scheduler.is_some_and(|scheduler| {
            scheduler.request_idle(Box::new(task) as Task);
            true
        })
    }
}

/// A component's render capability and optional lifecycle hooks.
pub trait Render: 'static {
    /// Produces the description tree. Reactive reads made here are tracked.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when the tree cannot be produced.
    fn render(&self, scope: &Scope<'_>) -> Result<VNode, RenderError>;

    /// State the component starts with.
    fn initial_state(&self, _props: &Map<String, Value>) -> Map<String, Value> {
        Map::new()
    }

    /// Called once after the first commit.
    fn on_mount(&self, _scope: &Scope<'_>) {}

    /// Called once after the output has been removed.
    fn on_unmount(&self, _scope: &Scope<'_>) {}

    /// Called after every commit. Reads here are not tracked.
    fn after_render(&self, _scope: &Scope<'_>) {}

    /// Page metadata used when the component is rendered as a whole page.
    fn meta(&self) -> PageMeta {
        PageMeta::default()
    }
}

/// A [`Render`] implementation backed by a closure.
pub struct FnView<F>(F);

impl<F> fmt::Debug for FnView<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(core::any::type_name::<Self>())
    }
}

impl<F> Render for FnView<F>
where
    F: Fn(&Scope<'_>) -> Result<VNode, RenderError> + 'static,
{
    fn render(&self, scope: &Scope<'_>) -> Result<VNode, RenderError> {
        (self.0)(scope)
    }
}

/// Wraps a render closure as a component.
///
/// ```rust
/// use brook_core::{VNode, from_fn, h};
///
/// let view = from_fn(|scope| {
///     let count = scope.state().get_or("count", 0_i64);
///     Ok(VNode::from(h("p").child(count)))
/// });
/// # let _ = view;
/// ```
pub const fn from_fn<F>(f: F) -> FnView<F>
where
    F: Fn(&Scope<'_>) -> Result<VNode, RenderError> + 'static,
{
    FnView(f)
}
