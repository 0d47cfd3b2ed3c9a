//! The component shell: reactive re-rendering, hydration and failure containment.
//!
//! A [`Component`] owns a [`Render`] implementation together with its props and reactive
//! [`State`]. Mounting installs a single effect whose body renders and commits the output;
//! every state write the last render read re-runs it synchronously. The first run hydrates
//! when the container already holds server output and mounts fresh otherwise. A commit that
//! fails without self-healing leaves the host tree out of step with the committed roots, so
//! the next commit clears the container and mounts fresh.

use alloc::{
    boxed::Box,
    rc::{Rc, Weak},
    string::String,
    vec::Vec,
};
use core::{
    cell::{Cell, RefCell},
    fmt,
};

use brook_core::{Config, IdleScheduler, NodeId, Render, Scope, VNode, h};
use brook_dom::{Document, SharedDocument, diff_children, hydrate, mount, unmount};
use brook_reactive::{Effect, Map, State, Value, effect, release, untracked};

use crate::Error;

/// A realized element a component renders into.
#[derive(Clone)]
pub struct Container {
    doc: SharedDocument,
    node: NodeId,
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container").field("node", &self.node).finish()
    }
}

impl Container {
    /// Wraps an element of `doc`.
    #[must_use]
    pub const fn new(doc: SharedDocument, node: NodeId) -> Self {
        Self { doc, node }
    }

    /// Uses the document root as the container.
    #[must_use]
    pub fn root(doc: SharedDocument) -> Self {
        let node = doc.borrow().root();
        Self { doc, node }
    }

    /// The document the container belongs to.
    #[must_use]
    pub const fn doc(&self) -> &SharedDocument {
        &self.doc
    }

    /// The container element.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        self.node
    }
}

/// Markup substituted for a failed render when self-healing is on.
#[must_use]
pub fn fallback_node() -> VNode {
    h("div")
        .class("brook-error")
        .attr("role", "alert")
        .child("Something went wrong.")
        .into()
}

/// Clears `container` and mounts `roots` into it from scratch.
fn rebuild(doc: &mut Document, container: NodeId, roots: &[VNode]) -> Result<(), Error> {
    doc.clear_children(container)?;
    for root in roots {
        mount(doc, root, container, None)?;
    }
    Ok(())
}

struct Mounted {
    container: Container,
    roots: Vec<VNode>,
    hydrating: bool,
    committed: bool,
    /// Set when a commit failed part-way; the host tree no longer matches `roots`.
    stale: bool,
    effect: Option<Effect>,
}

struct Inner {
    view: Box<dyn Render>,
    props: Map<String, Value>,
    state: State,
    config: Cell<Config>,
    scheduler: RefCell<Option<Rc<dyn IdleScheduler>>>,
    low_priority: Cell<bool>,
    mounted: RefCell<Option<Mounted>>,
    pending: RefCell<Option<VNode>>,
    error: RefCell<Option<Error>>,
}

/// A mounted or mountable instance of a [`Render`] implementation.
pub struct Component {
    inner: Rc<Inner>,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("props", &self.inner.props)
            .field("state", &self.inner.state)
            .field("config", &self.inner.config.get())
            .field("mounted", &self.is_mounted())
            .field("roots", &self.roots())
            .finish_non_exhaustive()
    }
}

impl Component {
    /// Creates an unmounted component. Its state starts from [`Render::initial_state`].
    pub fn new(view: impl Render, props: Map<String, Value>) -> Self {
        let state = State::from_map(view.initial_state(&props));
        Self {
            inner: Rc::new(Inner {
                view: Box::new(view),
                props,
                state,
                config: Cell::new(Config::default()),
                scheduler: RefCell::new(None),
                low_priority: Cell::new(false),
                mounted: RefCell::new(None),
                pending: RefCell::new(None),
                error: RefCell::new(None),
            }),
        }
    }

    /// Sets the feature flags this component reads.
    #[must_use]
    pub fn with_config(self, config: Config) -> Self {
        self.inner.config.set(config);
        self
    }

    /// Sets the idle scheduler used for deferred commits and [`Scope::schedule`].
    #[must_use]
    pub fn with_scheduler(self, scheduler: Rc<dyn IdleScheduler>) -> Self {
        *self.inner.scheduler.borrow_mut() = Some(scheduler);
        self
    }

    /// Defers commits after the first one to the idle scheduler.
    #[must_use]
    pub fn low_priority(self, enabled: bool) -> Self {
        self.inner.low_priority.set(enabled);
        self
    }

    /// The component's props.
    #[must_use]
    pub fn props(&self) -> &Map<String, Value> {
        &self.inner.props
    }

    /// The component's reactive state. Clones share the same store.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.inner.state
    }

    /// Returns `true` between [`mount`](Self::mount) and [`unmount`](Self::unmount).
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.borrow().is_some()
    }

    /// Number of root description nodes currently committed.
    #[must_use]
    pub fn roots(&self) -> usize {
        self.inner
            .mounted
            .borrow()
            .as_ref()
            .map_or(0, |mounted| mounted.roots.len())
    }

    /// Realized nodes of the committed roots, in order.
    #[must_use]
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.inner
            .mounted
            .borrow()
            .as_ref()
            .map(|mounted| mounted.roots.iter().filter_map(VNode::el).collect())
            .unwrap_or_default()
    }

    /// Returns `true` while a deferred commit waits for the idle scheduler.
    #[must_use]
    pub fn has_pending_commit(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// Takes the error left by the last failed re-render, if any.
    ///
    /// Re-renders triggered by state writes cannot report failures to the writer; they are
    /// logged and kept here instead.
    pub fn take_error(&self) -> Option<Error> {
        self.inner.error.borrow_mut().take()
    }

    /// Mounts the component into `container`. Mounting a mounted component does nothing.
    ///
    /// A container that already has children is hydrated instead of overwritten.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first render or commit when self-healing is off. The
    /// component stays unmounted in that case.
    pub fn mount(&self, container: Container) -> Result<(), Error> {
        if self.is_mounted() {
            tracing::debug!(target: "brook", "component already mounted");
            return Ok(());
        }
        let hydrating = container
            .doc
            .try_borrow()
            .map_err(|_| Error::DocumentBusy)?
            .has_child_nodes(container.node);
        tracing::debug!(target: "brook", container = %container.node, hydrating, "mounting component");

        self.inner.error.borrow_mut().take();
        *self.inner.mounted.borrow_mut() = Some(Mounted {
            container,
            roots: Vec::new(),
            hydrating,
            committed: false,
            stale: false,
            effect: None,
        });

        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        let effect = effect(move || {
            if let Some(inner) = weak.upgrade()
                && let Err(error) = inner.refresh()
            {
                inner.fail(error);
            }
        });

        if let Some(error) = self.inner.error.borrow_mut().take() {
            effect.stop();
            self.inner.mounted.borrow_mut().take();
            return Err(error);
        }
        if let Some(mounted) = self.inner.mounted.borrow_mut().as_mut() {
            mounted.effect = Some(effect);
        }
        self.inner.with_scope(|scope| self.inner.view.on_mount(scope));
        Ok(())
    }

    /// Re-renders and commits now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMounted`] for an unmounted component, otherwise the failure of the
    /// render or commit when self-healing is off.
    pub fn update(&self) -> Result<(), Error> {
        let effect = self
            .inner
            .mounted
            .borrow()
            .as_ref()
            .and_then(|mounted| mounted.effect.clone())
            .ok_or(Error::NotMounted)?;
        effect.run();
        self.take_error().map_or(Ok(()), Err)
    }

    /// Merges `partial` into the state. Keys whose value changed re-render dependents.
    pub fn set_state(&self, partial: Map<String, Value>) {
        let changed = self.inner.state.merge(partial);
        tracing::trace!(target: "brook", changed = ?changed, "state merged");
    }

    /// Finds the first element under the container matching `selector`.
    ///
    /// Returns `Ok(None)` when the component is not mounted.
    ///
    /// # Errors
    ///
    /// Fails on an invalid selector or when the document is borrowed elsewhere.
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>, Error> {
        let Some(container) = self.inner.container() else {
            return Ok(None);
        };
        let doc = container.doc.try_borrow().map_err(|_| Error::DocumentBusy)?;
        Ok(doc.query_selector(container.node, selector)?)
    }

    /// Removes the output, stops reacting to state and runs [`Render::on_unmount`].
    ///
    /// Unmounting an unmounted component does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first failure reported while removing the output. The component is
    /// unmounted regardless.
    pub fn unmount(&self) -> Result<(), Error> {
        let Some(mounted) = self.inner.mounted.borrow_mut().take() else {
            return Ok(());
        };
        if let Some(effect) = &mounted.effect {
            effect.stop();
        }
        self.inner.pending.borrow_mut().take();
        let result = mounted
            .container
            .doc
            .try_borrow_mut()
            .map_err(|_| Error::DocumentBusy)
            .and_then(|mut doc| {
                mounted
                    .roots
                    .iter()
                    .try_for_each(|root| unmount(&mut doc, root))
                    .map_err(Error::from)
            });
        release(self.inner.state.id());
        tracing::debug!(target: "brook", container = %mounted.container.node, "unmounted component");
        self.inner.with_scope(|scope| self.inner.view.on_unmount(scope));
        result
    }
}

impl Inner {
    fn container(&self) -> Option<Container> {
        self.mounted
            .borrow()
            .as_ref()
            .map(|mounted| mounted.container.clone())
    }

    fn with_scope<R>(&self, f: impl FnOnce(&Scope<'_>) -> R) -> R {
        let config = self.config.get();
        let scheduler = self.scheduler.borrow().clone();
        f(&Scope::new(&self.props, &self.state, &config, scheduler.as_ref()))
    }

    fn defers_commits(&self) -> bool {
        self.low_priority.get() || self.config.get().priority_render
    }

    /// Body of the update effect.
    fn refresh(self: &Rc<Self>) -> Result<(), Error> {
        let first = match self.mounted.borrow().as_ref() {
            Some(mounted) => !mounted.committed,
            None => return Ok(()),
        };
        let mut node = self.render()?;
        if !first && self.defers_commits() {
            match self.defer(node) {
                Some(node_back) => node = node_back,
                None => return Ok(()),
            }
        }
        self.commit(node)
    }

    fn render(&self) -> Result<VNode, Error> {
        let result = self.with_scope(|scope| self.view.render(scope));
        match result {
            Ok(node) => Ok(node),
            Err(error) if self.config.get().self_healing => {
                tracing::error!(target: "brook", %error, "render failed, showing fallback");
                Ok(fallback_node())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Queues `node` for the next idle point. Hands it back when there is no scheduler.
    fn defer(self: &Rc<Self>, node: VNode) -> Option<VNode> {
        let Some(scheduler) = self.scheduler.borrow().clone() else {
            return Some(node);
        };
        let already_queued = self.pending.borrow_mut().replace(node).is_some();
        if already_queued {
            tracing::trace!(target: "brook", "coalesced deferred commit");
            return None;
        }
        let weak = Rc::downgrade(self);
        scheduler.request_idle(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.flush();
            }
        }));
        tracing::debug!(target: "brook", "deferred commit to idle");
        None
    }

    fn flush(&self) {
        let Some(node) = self.pending.borrow_mut().take() else {
            return;
        };
        if let Err(error) = self.commit(node) {
            self.fail(error);
        }
    }

    fn commit(&self, node: VNode) -> Result<(), Error> {
        {
            let mut slot = self.mounted.borrow_mut();
            let Some(mounted) = slot.as_mut() else {
                return Ok(());
            };
            let container = mounted.container.clone();
            let mut doc = container
                .doc
                .try_borrow_mut()
                .map_err(|_| Error::DocumentBusy)?;

            let mut roots = node.into_roots();
            let result = if mounted.stale {
                tracing::debug!(target: "brook", "rebuilding container after a failed commit");
                rebuild(&mut doc, container.node, &roots)
            } else if mounted.hydrating {
                let tree = VNode::Fragment(core::mem::take(&mut roots));
                let result = hydrate(&mut doc, &tree, container.node)
                    .map(|report| {
                        tracing::debug!(target: "brook", ?report, "hydrated component");
                    })
                    .map_err(Error::from);
                roots = tree.into_roots();
                result
            } else {
                diff_children(&mut doc, &mounted.roots, &roots, container.node)
                    .map_err(Error::from)
            };

            if let Err(error) = result {
                if !self.config.get().self_healing {
                    mounted.stale = true;
                    return Err(error);
                }
                tracing::error!(target: "brook", %error, "commit failed, resetting container");
                rebuild(&mut doc, container.node, &roots)?;
            }
            mounted.roots = roots;
            mounted.hydrating = false;
            mounted.committed = true;
            mounted.stale = false;
        }
        untracked(|| self.with_scope(|scope| self.view.after_render(scope)));
        Ok(())
    }

    fn fail(&self, error: Error) {
        tracing::error!(target: "brook", %error, "component update failed");
        *self.error.borrow_mut() = Some(error);
    }
}
