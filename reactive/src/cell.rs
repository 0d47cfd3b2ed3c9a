//! A single tracked value.

use alloc::rc::Rc;
use core::{cell::RefCell, fmt};

use crate::{
    VALUE_KEY,
    runtime::{self, TargetId},
};

struct ReactiveInner<T> {
    id: TargetId,
    value: RefCell<T>,
}

impl<T> Drop for ReactiveInner<T> {
    fn drop(&mut self) {
        runtime::release(self.id);
    }
}

/// A shared value whose reads are tracked and whose writes notify dependent effects.
///
/// Reads go through [`get`](Self::get) or [`with`](Self::with); writes through
/// [`set`](Self::set) or [`update`](Self::update). A write that leaves the value equal to the
/// previous one notifies nobody.
pub struct Reactive<T> {
    inner: Rc<ReactiveInner<T>>,
}

impl<T> Clone for Reactive<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Reactive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

impl<T: Default> Default for Reactive<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Reactive<T> {
    /// Wraps `value` in a new reactive cell.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ReactiveInner {
                id: TargetId::next(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Returns the registry handle of this cell.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Borrows the value, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        runtime::track(self.inner.id, VALUE_KEY);
        f(&self.inner.value.borrow())
    }

    /// Returns `true` when both handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Reactive<T> {
    /// Returns a copy of the value, tracking the read.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(Clone::clone)
    }

    /// Returns a copy of the value without tracking.
    #[must_use]
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: PartialEq> Reactive<T> {
    /// Replaces the value, notifying dependents when it changed.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let changed = {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        };
        if changed {
            runtime::trigger(self.inner.id, VALUE_KEY);
        }
        changed
    }
}

impl<T: Clone + PartialEq> Reactive<T> {
    /// Mutates a copy of the value and writes it back through [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next)
    }
}
