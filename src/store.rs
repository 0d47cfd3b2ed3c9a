//! Application-wide observable state.
//!
//! A [`Store`] wraps a [`Reactive`] value: components that read it during render re-render on
//! change like with any other reactive value, and code outside the component tree can
//! [`subscribe`](Store::subscribe) to be called after every change.

use alloc::{
    boxed::Box,
    rc::{Rc, Weak},
    vec::Vec,
};
use core::{
    cell::{Cell, RefCell},
    fmt,
};

use brook_reactive::Reactive;
use indexmap::IndexMap;

type Listener<T> = Rc<dyn Fn(&T)>;

struct Listeners<T> {
    next: Cell<u64>,
    entries: RefCell<IndexMap<u64, Listener<T>>>,
}

/// A state change applied through [`Store::dispatch`].
pub trait Action<T> {
    /// Mutates the state.
    fn apply(self, state: &mut T);
}

impl<T, F: FnOnce(&mut T)> Action<T> for F {
    fn apply(self, state: &mut T) {
        self(state);
    }
}

/// Shared, observable application state.
pub struct Store<T> {
    value: Reactive<T>,
    listeners: Rc<Listeners<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.value)
            .field("listeners", &self.listeners.entries.borrow().len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Store<T> {
    /// Creates a store holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            value: Reactive::new(initial),
            listeners: Rc::new(Listeners {
                next: Cell::new(0),
                entries: RefCell::new(IndexMap::new()),
            }),
        }
    }

    /// Returns a copy of the state, tracking the read.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Borrows the state, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.value.with(f)
    }

    /// Replaces the state. Returns `true` and notifies when it changed.
    pub fn set(&self, value: T) -> bool {
        let changed = self.value.set(value);
        if changed {
            self.notify();
        }
        changed
    }

    /// Mutates a copy of the state and stores it. Returns `true` and notifies when it changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let changed = self.value.update(f);
        if changed {
            self.notify();
        }
        changed
    }

    /// Applies `action` to the state.
    pub fn dispatch(&self, action: impl Action<T>) -> bool {
        self.update(|state| action.apply(state))
    }

    /// Calls `listener` after every change until the returned [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = self.listeners.next.get();
        self.listeners.next.set(id + 1);
        self.listeners
            .entries
            .borrow_mut()
            .insert(id, Rc::new(listener));

        let listeners = Rc::downgrade(&self.listeners);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(listeners) = Weak::upgrade(&listeners) {
                    listeners.entries.borrow_mut().shift_remove(&id);
                }
            })),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.entries.borrow().len()
    }

    fn notify(&self) {
        let listeners: Vec<Listener<T>> =
            self.listeners.entries.borrow().values().cloned().collect();
        let state = self.value.get_untracked();
        for listener in listeners {
            listener(&state);
        }
    }
}

/// Keeps a [`Store`] listener registered while alive.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

impl Subscription {
    /// Unsubscribes now.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
