//! Keyed reactive store backing component state.

use alloc::{rc::Rc, string::String, vec::Vec};
use core::{cell::RefCell, fmt};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::runtime::{self, TargetId};

struct StateInner {
    id: TargetId,
    values: RefCell<Map<String, Value>>,
}

impl Drop for StateInner {
    fn drop(&mut self) {
        runtime::release(self.id);
    }
}

/// A mutable `key -> value` store where every key is tracked independently.
///
/// Values are JSON values so state can be merged from partial updates and embedded in
/// server-rendered pages as-is. Reading a key inside an effect subscribes the effect to that
/// key only; writing a key notifies its readers when the new value differs from the old one.
#[derive(Clone)]
pub struct State {
    inner: Rc<StateInner>,
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.inner.id)
            .field("values", &*self.inner.values.borrow())
            .finish()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for State {
    fn from(values: Map<String, Value>) -> Self {
        Self::from_map(values)
    }
}

impl State {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Creates a store seeded with `values`.
    #[must_use]
    pub fn from_map(values: Map<String, Value>) -> Self {
        Self {
            inner: Rc::new(StateInner {
                id: TargetId::next(),
                values: RefCell::new(values),
            }),
        }
    }

    /// Returns the registry handle of this store.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.inner.id
    }

    /// Reads `key`, tracking the read. Missing keys are tracked too.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        runtime::track(self.inner.id, key);
        self.inner.values.borrow().get(key).cloned()
    }

    /// Reads `key` and deserializes it, tracking the read.
    ///
    /// Returns `None` when the key is missing or holds a value of another shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Like [`get_as`](Self::get_as) with a fallback for missing or mistyped values.
    #[must_use]
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_as(key).unwrap_or(default)
    }

    /// Returns `true` if `key` is present, tracking the read.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        runtime::track(self.inner.id, key);
        self.inner.values.borrow().contains_key(key)
    }

    /// Writes `key`, notifying its readers when the value changed.
    ///
    /// Returns `true` if the value changed.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        let changed = {
            let mut values = self.inner.values.borrow_mut();
            if values.get(&key) == Some(&value) {
                false
            } else {
                values.insert(key.clone(), value);
                true
            }
        };
        if changed {
            runtime::trigger(self.inner.id, &key);
        }
        changed
    }

    /// Removes `key`, notifying its readers if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.inner.values.borrow_mut().remove(key);
        if removed.is_some() {
            runtime::trigger(self.inner.id, key);
        }
        removed
    }

    /// Writes every entry of `partial`. Returns the keys that changed, in order.
    pub fn merge(&self, partial: Map<String, Value>) -> Vec<String> {
        partial
            .into_iter()
            .filter_map(|(key, value)| {
                let changed_key = key.clone();
                self.set(key, value).then_some(changed_key)
            })
            .collect()
    }

    /// Returns a copy of every entry without tracking.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner.values.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{effect, runtime::subscriber_count};
    use core::cell::Cell;
    use serde_json::json;

    fn partial(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn keys_are_tracked_independently() {
        let state = State::new();
        state.set("x", 1);
        state.set("y", 1);
        let runs = Rc::new(Cell::new(0));
        let _effect = effect({
            let (state, runs) = (state.clone(), runs.clone());
            move || {
                let _ = state.get("x");
                runs.set(runs.get() + 1);
            }
        });

        state.set("y", 2);
        assert_eq!(runs.get(), 1);
        state.set("x", 1);
        assert_eq!(runs.get(), 1);
        state.set("x", 2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn reading_a_missing_key_subscribes_to_it() {
        let state = State::new();
        let seen = Rc::new(Cell::new(0_i64));
        let _effect = effect({
            let (state, seen) = (state.clone(), seen.clone());
            move || seen.set(state.get_or("count", 0))
        });
        assert_eq!(subscriber_count(state.id(), "count"), 1);
        state.set("count", 7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn merge_reports_changed_keys() {
        let state = State::from_map(partial(json!({ "a": 1, "b": "two" })));
        let changed = state.merge(partial(json!({ "a": 1, "b": "three", "c": true })));
        assert_eq!(changed, ["b", "c"]);
        assert_eq!(state.get_as::<String>("b").as_deref(), Some("three"));
        assert_eq!(state.get_as::<bool>("c"), Some(true));
    }

    #[test]
    fn mistyped_reads_fall_back() {
        let state = State::new();
        state.set("flag", "yes");
        assert_eq!(state.get_as::<bool>("flag"), None);
        assert!(!state.get_or("flag", false));
    }

    #[test]
    fn remove_notifies_readers() {
        let state = State::new();
        state.set("k", 1);
        let present = Rc::new(Cell::new(false));
        let _effect = effect({
            let (state, present) = (state.clone(), present.clone());
            move || present.set(state.contains("k"))
        });
        assert!(present.get());
        assert_eq!(state.remove("k"), Some(json!(1)));
        assert!(!present.get());
    }

    #[test]
    fn dropping_the_store_releases_its_subscriptions() {
        let state = State::new();
        let id = state.id();
        let _effect = effect({
            let state = state.clone();
            move || {
                let _ = state.get("k");
            }
        });
        assert_eq!(subscriber_count(id, "k"), 1);
        drop(_effect);
        drop(state);
        assert_eq!(subscriber_count(id, "k"), 0);
    }
}
