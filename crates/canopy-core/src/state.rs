//! Immutable state snapshots
//!
//! A [`State`] is one store's entire state at a point in time. Cloning is
//! O(1) and two clones are [`Same`](crate::Same). A snapshot is never
//! changed in place; [`update`](crate::update) always produces a new one.

use crate::{Error, Result, Value, ValueMap};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

/// An immutable, structurally shared state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Arc<ValueMap>);

impl State {
    /// Create a snapshot owning the given fields
    pub fn new(fields: ValueMap) -> Self {
        Self(Arc::new(fields))
    }

    /// The shared empty snapshot
    ///
    /// Every call returns the same allocation, so repeated "missing slice"
    /// lookups never look like a change.
    pub fn empty() -> Self {
        static EMPTY: OnceLock<State> = OnceLock::new();
        EMPTY.get_or_init(|| State::new(ValueMap::new())).clone()
    }

    /// Wrap an existing shared map without copying it
    pub fn from_arc(fields: Arc<ValueMap>) -> Self {
        Self(fields)
    }

    /// Convert a map value into a snapshot, sharing its allocation
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Self(map)),
            other => Err(Error::expected_map("state", &other)),
        }
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Walk nested maps along `path`
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.as_map()?.get(*key)?;
        }
        Some(current)
    }

    /// All fields of this snapshot
    pub fn fields(&self) -> &ValueMap {
        &self.0
    }

    /// The shared map backing this snapshot
    pub fn as_arc(&self) -> &Arc<ValueMap> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check whether two snapshots are the same allocation
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// View this snapshot as a map value sharing the same allocation
    pub fn to_value(&self) -> Value {
        Value::Map(Arc::clone(&self.0))
    }
}

impl Default for State {
    fn default() -> Self {
        State::empty()
    }
}

impl From<ValueMap> for State {
    fn from(fields: ValueMap) -> Self {
        State::new(fields)
    }
}

impl TryFrom<Value> for State {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        State::from_value(value)
    }
}
