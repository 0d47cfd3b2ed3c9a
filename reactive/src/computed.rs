//! Lazily recomputed derived values.

use alloc::rc::Rc;
use core::{
    cell::{Cell, RefCell},
    fmt,
};

use crate::{
    VALUE_KEY,
    effect::{Effect, EffectOptions, effect_with},
    runtime::{self, TargetId},
};

struct ComputedInner<T> {
    id: TargetId,
    getter: Rc<dyn Fn() -> T>,
    value: Rc<RefCell<Option<T>>>,
    dirty: Rc<Cell<bool>>,
    effect: Effect,
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        self.effect.stop();
        runtime::release(self.id);
    }
}

/// A cached value derived from other reactive values.
///
/// Invalidation only flags the cache as dirty; the getter runs again on the next
/// [`get`](Self::get). Effects reading a computed value are notified when it is invalidated.
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("dirty", &self.inner.dirty.get())
            .finish_non_exhaustive()
    }
}

/// Creates a [`Computed`] from `getter`. The getter does not run until the first read.
pub fn computed<T: Clone + 'static>(getter: impl Fn() -> T + 'static) -> Computed<T> {
    Computed::new(getter)
}

impl<T: Clone + 'static> Computed<T> {
    /// See [`computed`].
    pub fn new(getter: impl Fn() -> T + 'static) -> Self {
        let id = TargetId::next();
        let getter: Rc<dyn Fn() -> T> = Rc::new(getter);
        let value = Rc::new(RefCell::new(None));
        let dirty = Rc::new(Cell::new(true));

        let body = {
            let getter = Rc::clone(&getter);
            let value = Rc::clone(&value);
            move || {
                let next = getter();
                *value.borrow_mut() = Some(next);
            }
        };
        let scheduler = {
            let dirty = Rc::clone(&dirty);
            move || {
                if !dirty.get() {
                    dirty.set(true);
                    runtime::trigger(id, VALUE_KEY);
                }
            }
        };
        let effect = effect_with(
            body,
            EffectOptions {
                lazy: true,
                scheduler: Some(Rc::new(scheduler)),
            },
        );

        Self {
            inner: Rc::new(ComputedInner {
                id,
                getter,
                value,
                dirty,
                effect,
            }),
        }
    }

    /// Returns the cached value, recomputing it first if a dependency changed.
    #[must_use]
    pub fn get(&self) -> T {
        let inner = &self.inner;
        if inner.dirty.get() {
            inner.effect.run();
            inner.dirty.set(false);
        }
        runtime::track(inner.id, VALUE_KEY);
        let cached = inner.value.borrow().clone();
        cached.unwrap_or_else(|| (inner.getter)())
    }

    /// Returns `true` when the next read will run the getter.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Returns the registry handle of this value.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.inner.id
    }
}
