//! The dependency registry shared by every reactive value on the current thread.
//!
//! Reactive objects are identified by a [`TargetId`] handed out at creation. The registry maps
//! `(target, key)` pairs to the effects that read them during their last run. Subscribers are
//! held weakly; an effect whose last handle was dropped is pruned the next time its key fires.

use alloc::{
    rc::{Rc, Weak},
    string::String,
    vec::Vec,
};
use core::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::effect::{EffectId, EffectInner};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_raw_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Stable handle identifying a reactive object inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(u64);

impl TargetId {
    /// Allocates a fresh identifier. Identifiers are never reused.
    #[must_use]
    pub fn next() -> Self {
        Self(next_raw_id())
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A `(target, key)` pair an effect depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DepKey {
    pub(crate) target: TargetId,
    pub(crate) key: String,
}

type Subscribers = IndexMap<EffectId, Weak<EffectInner>>;

#[derive(Default)]
struct Runtime {
    targets: RefCell<HashMap<TargetId, HashMap<String, Subscribers>>>,
    stack: RefCell<Vec<Rc<EffectInner>>>,
}

thread_local! {
    static RUNTIME: Runtime = Runtime::default();
}

/// Registers the currently running effect, if any, as a subscriber of `(target, key)`.
///
/// Outside of a running effect this is a no-op.
pub fn track(target: TargetId, key: &str) {
    RUNTIME.with(|rt| {
        let Some(active) = rt.stack.borrow().last().cloned() else {
            return;
        };
        let mut targets = rt.targets.borrow_mut();
        let keys = targets.entry(target).or_default();
        if !keys.contains_key(key) {
            keys.insert(key.to_owned(), Subscribers::default());
        }
        let Some(subscribers) = keys.get_mut(key) else {
            return;
        };
        if subscribers
            .insert(active.id(), Rc::downgrade(&active))
            .is_none()
        {
            active.push_dep(DepKey {
                target,
                key: key.to_owned(),
            });
        }
    });
}

/// Notifies every effect subscribed to `(target, key)`.
///
/// The subscriber set is snapshotted before dispatch: effects that subscribe while this call
/// is running are not reached by it.
pub fn trigger(target: TargetId, key: &str) {
    let snapshot: Vec<Rc<EffectInner>> = RUNTIME.with(|rt| {
        let mut targets = rt.targets.borrow_mut();
        let Some(subscribers) = targets.get_mut(&target).and_then(|keys| keys.get_mut(key))
        else {
            return Vec::new();
        };
        subscribers.retain(|_, effect| effect.strong_count() > 0);
        subscribers.values().filter_map(Weak::upgrade).collect()
    });

    if !snapshot.is_empty() {
        tracing::trace!(target: "brook::reactive", target_id = %target, key, subscribers = snapshot.len(), "trigger");
    }
    for effect in snapshot {
        effect.notify();
    }
}

/// Drops every subscription registered on `target`.
///
/// Effects that depended on the target keep their other dependencies.
pub fn release(target: TargetId) {
    // `try_with` because values may be dropped during thread-local teardown.
    let _ = RUNTIME.try_with(|rt| {
        if let Ok(mut targets) = rt.targets.try_borrow_mut() {
            targets.remove(&target);
        }
    });
}

/// Returns the number of live effects subscribed to `(target, key)`.
#[must_use]
pub fn subscriber_count(target: TargetId, key: &str) -> usize {
    RUNTIME.with(|rt| {
        rt.targets
            .borrow()
            .get(&target)
            .and_then(|keys| keys.get(key))
            .map_or(0, |subscribers| {
                subscribers
                    .values()
                    .filter(|effect| effect.strong_count() > 0)
                    .count()
            })
    })
}

/// Returns `true` while an effect is running on this thread.
#[must_use]
pub fn is_tracking() -> bool {
    RUNTIME.with(|rt| !rt.stack.borrow().is_empty())
}

/// Runs `f` with dependency tracking suspended.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let saved = RUNTIME.with(|rt| core::mem::take(&mut *rt.stack.borrow_mut()));
    let _restore = RestoreStack(Some(saved));
    f()
}

struct RestoreStack(Option<Vec<Rc<EffectInner>>>);

impl Drop for RestoreStack {
    fn drop(&mut self) {
        if let Some(saved) = self.0.take() {
            let _ = RUNTIME.try_with(|rt| *rt.stack.borrow_mut() = saved);
        }
    }
}

/// Removes the effect from every key it subscribed to and forgets those dependencies.
pub(crate) fn cleanup(effect: &EffectInner) {
    let deps = effect.take_deps();
    if deps.is_empty() {
        return;
    }
    let _ = RUNTIME.try_with(|rt| {
        let mut targets = rt.targets.borrow_mut();
        for dep in deps {
            let Some(keys) = targets.get_mut(&dep.target) else {
                continue;
            };
            if let Some(subscribers) = keys.get_mut(&dep.key) {
                subscribers.shift_remove(&effect.id());
                if subscribers.is_empty() {
                    keys.remove(&dep.key);
                }
            }
            if keys.is_empty() {
                targets.remove(&dep.target);
            }
        }
    });
}

/// Pushes `effect` as the active computation until the returned guard drops.
pub(crate) fn enter(effect: Rc<EffectInner>) -> ActiveGuard {
    RUNTIME.with(|rt| rt.stack.borrow_mut().push(effect));
    ActiveGuard(())
}

pub(crate) struct ActiveGuard(());

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let _ = RUNTIME.try_with(|rt| rt.stack.borrow_mut().pop());
    }
}
