//! Tracked computations.
//!
//! An [`Effect`] re-runs its body whenever a reactive value it read during its last run is
//! written with a different value. Before every run the previous dependency set is removed
//! from the registry, so after the run the effect is subscribed to exactly what it read.

use alloc::{boxed::Box, rc::Rc, vec::Vec};
use core::{
    cell::{Cell, RefCell},
    fmt,
};

use crate::runtime::{self, DepKey};

/// Re-runs allowed within one [`Effect::run`] before the effect gives up settling.
pub const MAX_RERUNS: usize = 100;

/// Identifier of an effect inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

/// Alternate reaction to invalidation, called instead of re-running the body.
pub type Scheduler = Rc<dyn Fn()>;

/// Options accepted by [`effect_with`].
#[derive(Default, Clone)]
pub struct EffectOptions {
    /// When `true` the body is not run at registration.
    pub lazy: bool,
    /// Called on invalidation instead of re-running the body.
    pub scheduler: Option<Scheduler>,
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("lazy", &self.lazy)
            .field("scheduler", &self.scheduler.is_some())
            .finish()
    }
}

pub(crate) struct EffectInner {
    id: EffectId,
    body: RefCell<Box<dyn FnMut()>>,
    deps: RefCell<Vec<DepKey>>,
    scheduler: Option<Scheduler>,
    active: Cell<bool>,
    rerun: Cell<bool>,
}

impl EffectInner {
    pub(crate) const fn id(&self) -> EffectId {
        self.id
    }

    pub(crate) fn push_dep(&self, dep: DepKey) {
        self.deps.borrow_mut().push(dep);
    }

    pub(crate) fn take_deps(&self) -> Vec<DepKey> {
        core::mem::take(&mut *self.deps.borrow_mut())
    }

    /// Reaction to a trigger: the scheduler when present, otherwise a re-run.
    pub(crate) fn notify(self: &Rc<Self>) {
        if !self.active.get() {
            return;
        }
        if let Some(scheduler) = &self.scheduler {
            scheduler();
        } else {
            self.run();
        }
    }

    fn run(self: &Rc<Self>) {
        if !self.active.get() {
            return;
        }
        // Invalidated while running: the outer run repeats the body once it returns.
        let Ok(mut body) = self.body.try_borrow_mut() else {
            tracing::trace!(target: "brook::reactive", id = self.id.0, "invalidated while running");
            self.rerun.set(true);
            return;
        };
        let mut reruns = 0;
        loop {
            self.rerun.set(false);
            runtime::cleanup(self);
            {
                let _guard = runtime::enter(Rc::clone(self));
                body();
            }
            if !self.rerun.get() || !self.active.get() {
                break;
            }
            reruns += 1;
            if reruns > MAX_RERUNS {
                tracing::warn!(
                    target: "brook::reactive",
                    id = self.id.0,
                    "effect keeps invalidating itself, giving up after {MAX_RERUNS} re-runs"
                );
                self.rerun.set(false);
                break;
            }
        }
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        runtime::cleanup(self);
    }
}

/// Handle to a registered effect.
///
/// Handles are cheap to clone. The registry only keeps weak references, so dropping the last
/// handle disposes of the effect.
#[derive(Clone)]
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("active", &self.inner.active.get())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

impl Effect {
    /// Returns the identifier of this effect.
    #[must_use]
    pub fn id(&self) -> EffectId {
        self.inner.id
    }

    /// Runs the body now, re-collecting its dependencies.
    pub fn run(&self) {
        self.inner.run();
    }

    /// Unsubscribes the effect from everything and prevents further runs.
    pub fn stop(&self) {
        self.inner.active.set(false);
        runtime::cleanup(&self.inner);
    }

    /// Returns `false` once [`stop`](Self::stop) was called.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Number of `(target, key)` pairs read during the last run.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }
}

/// Registers `f` as an effect and runs it once immediately.
pub fn effect(f: impl FnMut() + 'static) -> Effect {
    effect_with(f, EffectOptions::default())
}

/// Registers `f` as an effect with explicit [`EffectOptions`].
pub fn effect_with(f: impl FnMut() + 'static, options: EffectOptions) -> Effect {
    let effect = Effect {
        inner: Rc::new(EffectInner {
            id: EffectId(runtime::next_raw_id()),
            body: RefCell::new(Box::new(f)),
            deps: RefCell::new(Vec::new()),
            scheduler: options.scheduler,
            active: Cell::new(true),
            rerun: Cell::new(false),
        }),
    };
    if !options.lazy {
        effect.run();
    }
    effect
}
