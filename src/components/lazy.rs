//! Deferred loading of a component.

use alloc::{boxed::Box, rc::Rc, string::String};
use core::{cell::RefCell, fmt};

use brook_core::{Render, RenderError, Scope, VNode, h};
use brook_reactive::{Map, State, Value};

/// Produces the component a [`Lazy`] stands in for.
pub type Loader = Box<dyn FnOnce() -> Result<Box<dyn Render>, RenderError>>;

/// State key set once the loaded component is available.
const LOADED: &str = "loaded";

struct Slot {
    loader: RefCell<Option<Loader>>,
    loaded: RefCell<Option<Box<dyn Render>>>,
}

impl Slot {
    fn load(&self, state: &State) {
        let Some(loader) = self.loader.borrow_mut().take() else {
            return;
        };
        match loader() {
            Ok(view) => {
                *self.loaded.borrow_mut() = Some(view);
                state.set(LOADED, true);
            }
            Err(error) => {
                tracing::error!(target: "brook", %error, "lazy component failed to load");
            }
        }
    }
}

/// Renders a placeholder until its loader has produced the real component.
///
/// Loading starts on mount, at the next idle point when the host provides a scheduler and
/// immediately otherwise. The loaded component renders with the placeholder's props and
/// state. On the server a `Lazy` always renders its placeholder.
pub struct Lazy {
    slot: Rc<Slot>,
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("pending", &self.slot.loader.borrow().is_some())
            .field("loaded", &self.slot.loaded.borrow().is_some())
            .finish()
    }
}

impl Lazy {
    /// Class of the placeholder element.
    pub const PLACEHOLDER_CLASS: &'static str = "brook-lazy-placeholder";

    /// Wraps `loader`.
    pub fn new<F, V>(loader: F) -> Self
    where
        F: FnOnce() -> Result<V, RenderError> + 'static,
        V: Render,
    {
        let loader: Loader =
            Box::new(move || loader().map(|view| Box::new(view) as Box<dyn Render>));
        Self {
            slot: Rc::new(Slot {
                loader: RefCell::new(Some(loader)),
                loaded: RefCell::new(None),
            }),
        }
    }

    fn placeholder() -> VNode {
        h("div")
            .class(Self::PLACEHOLDER_CLASS)
            .attr("style", "min-height: 100px")
            .child("Loading...")
            .into()
    }
}

impl Render for Lazy {
    fn render(&self, scope: &Scope<'_>) -> Result<VNode, RenderError> {
        if !scope.state().get_or(LOADED, false) {
            return Ok(Self::placeholder());
        }
        match self.slot.loaded.borrow().as_ref() {
            Some(view) => view.render(scope),
            None => Ok(Self::placeholder()),
        }
    }

    fn initial_state(&self, _props: &Map<String, Value>) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert(LOADED.into(), Value::Bool(false));
        state
    }

    fn on_mount(&self, scope: &Scope<'_>) {
        let slot = Rc::clone(&self.slot);
        let state = scope.state().clone();
        if !scope.schedule(move || slot.load(&state)) {
            self.slot.load(scope.state());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Component, Container};
    use brook_core::{IdleQueue, from_fn};
    use brook_dom::Document;

    struct Never;

    impl Render for Never {
        fn render(&self, _scope: &Scope<'_>) -> Result<VNode, RenderError> {
            Ok(VNode::empty())
        }
    }

    fn html(container: &Container) -> String {
        container.doc().borrow().inner_html(container.node())
    }

    #[test]
    fn shows_the_placeholder_then_the_loaded_view() {
        let container = Container::root(Document::new().shared());
        let lazy = Lazy::new(|| Ok(from_fn(|_| Ok(h("p").child("chart").into()))));
        let queue = IdleQueue::new();
        let component = Component::new(lazy, Map::new()).with_scheduler(Rc::new(queue.clone()));
        component.mount(container.clone()).expect("mount");
        assert_eq!(
            html(&container),
            r#"<div class="brook-lazy-placeholder" style="min-height: 100px">Loading...</div>"#
        );

        queue.run_until_idle();
        assert_eq!(html(&container), "<p>chart</p>");
    }

    #[test]
    fn loads_immediately_without_a_scheduler() {
        let container = Container::root(Document::new().shared());
        let lazy = Lazy::new(|| Ok(from_fn(|_| Ok(VNode::text("ready")))));
        Component::new(lazy, Map::new())
            .mount(container.clone())
            .map(|()| assert_eq!(html(&container), "ready"))
            .expect("mount");
    }

    #[test]
    fn failed_loads_keep_the_placeholder() {
        let container = Container::root(Document::new().shared());
        let lazy = Lazy::new(|| Err::<Never, _>(RenderError::Load("offline".into())));
        let component = Component::new(lazy, Map::new());
        component.mount(container.clone()).expect("mount");
        assert!(html(&container).contains(Lazy::PLACEHOLDER_CLASS));
        assert_eq!(component.take_error(), None);
    }
}
