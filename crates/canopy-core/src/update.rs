//! Immutable update primitive
//!
//! [`update`] derives the next snapshot from the current one and a
//! [`Setter`]. The current snapshot is never touched. After the setter runs,
//! the result is reconciled against the base: any subtree that ended up
//! identical by [`Same`] is swapped back for the base's allocation, and if
//! nothing changed at all the base itself is returned.
//!
//! # Example
//!
//! ```
//! use canopy_core::{update, Setter, State, Value, ValueMap};
//!
//! let base = State::new(ValueMap::from_iter([
//!     ("count".to_string(), Value::Int(0)),
//!     ("items".to_string(), Value::list(vec!["a"])),
//! ]));
//!
//! let next = update(&base, &Setter::field("count", 3i64));
//! assert_eq!(next.get("count"), Some(&Value::Int(3)));
//! assert_eq!(base.get("count"), Some(&Value::Int(0)));
//! ```

use crate::{Error, Result, Same, State, Value, ValueMap};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;
use std::sync::Arc;

/// A mutable working copy of a snapshot handed to recipes
///
/// Starts as a shallow copy of the base, so unchanged fields keep sharing
/// their allocations. Nested compound values are copied on first write via
/// [`Value::as_map_mut`] / [`Value::as_list_mut`].
#[derive(Debug, Clone)]
pub struct Draft {
    fields: ValueMap,
}

impl Draft {
    fn new(base: &State) -> Self {
        Self {
            fields: base.fields().clone(),
        }
    }

    /// Set a field
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Replace the whole working copy
    pub fn replace(&mut self, fields: ValueMap) {
        self.fields = fields;
    }

    pub fn into_fields(self) -> ValueMap {
        self.fields
    }
}

impl Deref for Draft {
    type Target = ValueMap;

    fn deref(&self) -> &ValueMap {
        &self.fields
    }
}

impl DerefMut for Draft {
    fn deref_mut(&mut self) -> &mut ValueMap {
        &mut self.fields
    }
}

/// A state transformation
#[derive(Clone)]
pub enum Setter {
    /// Mutate a working copy of the current state
    Recipe(Rc<dyn Fn(&mut Draft)>),
    /// Shallow-merge these fields over the current state
    Patch(ValueMap),
}

impl Setter {
    /// Create a recipe setter
    pub fn recipe(f: impl Fn(&mut Draft) + 'static) -> Self {
        Setter::Recipe(Rc::new(f))
    }

    /// Create a patch from key/value pairs
    pub fn patch<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Setter::Patch(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Create a single-key patch
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut patch = ValueMap::with_capacity(1);
        patch.insert(key.into(), value.into());
        Setter::Patch(patch)
    }

    /// Apply this setter to a draft
    fn apply(&self, draft: &mut Draft) {
        match self {
            Setter::Recipe(recipe) => recipe(draft),
            Setter::Patch(patch) => {
                for (key, value) in patch {
                    draft.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

impl fmt::Debug for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Setter::Recipe(_) => f.write_str("Recipe(..)"),
            Setter::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
        }
    }
}

impl From<ValueMap> for Setter {
    fn from(patch: ValueMap) -> Self {
        Setter::Patch(patch)
    }
}

impl From<State> for Setter {
    fn from(state: State) -> Self {
        Setter::Patch(state.fields().clone())
    }
}

/// Only maps can be merged; any other value is rejected up front
impl TryFrom<Value> for Setter {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Setter::Patch(Arc::unwrap_or_clone(map))),
            other => Err(Error::expected_map("setter", &other)),
        }
    }
}

/// Produce the next snapshot from `current` and `setter`
pub fn update(current: &State, setter: &Setter) -> State {
    let mut draft = Draft::new(current);
    setter.apply(&mut draft);
    match reconcile_map(current.as_arc(), draft.into_fields()) {
        Reconciled::Unchanged => current.clone(),
        Reconciled::Changed(fields) => State::new(fields),
    }
}

enum Reconciled {
    Unchanged,
    Changed(ValueMap),
}

/// Restore base allocations for every entry of `next` that is unchanged
fn reconcile_map(base: &Arc<ValueMap>, mut next: ValueMap) -> Reconciled {
    let mut unchanged = base.len() == next.len();
    for (key, value) in next.iter_mut() {
        match base.get(key) {
            Some(old) => {
                let merged = reconcile(old, std::mem::take(value));
                if !merged.same(old) {
                    unchanged = false;
                }
                *value = merged;
            }
            None => unchanged = false,
        }
    }
    if unchanged {
        Reconciled::Unchanged
    } else {
        Reconciled::Changed(next)
    }
}

fn reconcile(old: &Value, next: Value) -> Value {
    match (old, next) {
        (Value::Map(base), Value::Map(map)) if !Arc::ptr_eq(base, &map) => {
            match reconcile_map(base, Arc::unwrap_or_clone(map)) {
                Reconciled::Unchanged => old.clone(),
                Reconciled::Changed(fields) => Value::Map(Arc::new(fields)),
            }
        }
        (Value::List(base), Value::List(list)) if !Arc::ptr_eq(base, &list) => {
            let mut items = Arc::unwrap_or_clone(list);
            let mut unchanged = base.len() == items.len();
            for (slot, prev) in items.iter_mut().zip(base.iter()) {
                let merged = reconcile(prev, std::mem::take(slot));
                if !merged.same(prev) {
                    unchanged = false;
                }
                *slot = merged;
            }
            if unchanged {
                old.clone()
            } else {
                Value::List(Arc::new(items))
            }
        }
        (_, next) => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> State {
        ron::from_str(
            r#"{
                "count": Int(0),
                "items": List([String("a")]),
                "nested": Map({"deep": Map({"flag": Bool(false)}), "other": Int(1)}),
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_patch_shares_untouched_fields() {
        let current = base();
        let before = current.clone();
        let snapshot: ValueMap = current.fields().clone();

        let next = update(&current, &Setter::field("count", 3i64));

        assert_eq!(current.fields(), &snapshot);
        assert!(current.ptr_eq(&before));
        assert_eq!(next.get("count"), Some(&Value::Int(3)));
        assert!(next.get("items").unwrap().same(current.get("items").unwrap()));
        assert!(next.get("nested").unwrap().same(current.get("nested").unwrap()));
    }

    #[test]
    fn test_noop_patch_returns_base() {
        let current = base();
        let items = current.get("items").cloned().unwrap();
        let next = update(&current, &Setter::patch([("count", Value::Int(0)), ("items", items)]));
        assert!(next.ptr_eq(&current));
    }

    #[test]
    fn test_recipe_copies_only_the_touched_path() {
        let current = base();
        let next = update(
            &current,
            &Setter::recipe(|draft| {
                let nested = draft.get_mut("nested").and_then(Value::as_map_mut).unwrap();
                let deep = nested.get_mut("deep").and_then(Value::as_map_mut).unwrap();
                deep.insert("flag".into(), Value::Bool(true));
            }),
        );

        assert_eq!(next.get_path(&["nested", "deep", "flag"]), Some(&Value::Bool(true)));
        assert_eq!(current.get_path(&["nested", "deep", "flag"]), Some(&Value::Bool(false)));
        assert!(!next.get("nested").unwrap().same(current.get("nested").unwrap()));
        assert!(next.get("items").unwrap().same(current.get("items").unwrap()));
    }

    #[test]
    fn test_recipe_that_rewrites_equal_values_is_a_noop() {
        let current = base();
        let next = update(
            &current,
            &Setter::recipe(|draft| {
                let items = draft.get_mut("items").and_then(Value::as_list_mut).unwrap();
                items[0] = Value::from("a");
            }),
        );
        assert!(next.ptr_eq(&current));
    }

    #[test]
    fn test_recipe_replace_and_remove() {
        let current = base();
        let replaced = update(
            &current,
            &Setter::recipe(|draft| draft.replace(ValueMap::from_iter([("only".into(), Value::Int(1))]))),
        );
        assert_eq!(replaced.len(), 1);

        let removed = update(&current, &Setter::recipe(|draft| {
            draft.shift_remove("count");
        }));
        assert!(removed.get("count").is_none());
        assert_eq!(current.len(), 3);
    }

    #[test]
    fn test_setter_from_value_requires_map() {
        assert!(Setter::try_from(Value::map([("a", 1i64)])).is_ok());
        let err = Setter::try_from(Value::Int(3)).unwrap_err();
        assert_eq!(
            err,
            Error::Configuration("setter must be a map, got int".to_string())
        );
    }
}
