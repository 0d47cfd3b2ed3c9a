//! Dependency-tracked reactivity for Brook.
//!
//! Every reactive object ([`Reactive`], [`State`], [`Computed`]) is registered under a
//! [`TargetId`]. Reads performed while an [`Effect`] runs subscribe that effect to the
//! `(target, key)` pair that was read; writes that change a value re-run (or schedule) exactly
//! the effects subscribed to it.
//!
//! ```rust
//! use brook_reactive::{Reactive, effect};
//! use std::{cell::Cell, rc::Rc};
//!
//! let count = Reactive::new(1);
//! let seen = Rc::new(Cell::new(0));
//! let _effect = effect({
//!     let (count, seen) = (count.clone(), seen.clone());
//!     move || seen.set(count.get())
//! });
//! count.set(2);
//! assert_eq!(seen.get(), 2);
//! ```
//!
//! The runtime is single-threaded: effects run synchronously on the writing thread and may
//! themselves write state.

extern crate alloc;

mod cell;
mod computed;
mod effect;
mod runtime;
mod state;

pub use cell::Reactive;
pub use computed::{Computed, computed};
pub use effect::{
    Effect, EffectId, EffectOptions, MAX_RERUNS, Scheduler, effect, effect_with,
};
pub use runtime::{
    TargetId, is_tracking, release, subscriber_count, track, trigger, untracked,
};
pub use state::State;

/// Key under which single-value reactive objects register their readers.
pub const VALUE_KEY: &str = "value";

pub use serde_json::{Map, Value, json};
