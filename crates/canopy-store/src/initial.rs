//! Initial-state descriptors
//!
//! A store is seeded from an [`InitialState`]: a list of fields that are
//! either literal values or derivations over the store's own state. The
//! derivations become computed fields; their slot in the first snapshot
//! holds `Null` until the store evaluates them during construction.

use canopy_core::{Error, Result, State, Value, ValueMap};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Derivation function of a computed field
pub type Derive = Rc<dyn Fn(&State) -> Value>;

/// One entry of an initial-state descriptor
#[derive(Clone)]
pub enum Field {
    /// An ordinary state field
    Value(Value),
    /// A field derived from the rest of the state
    Computed(Derive),
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Field::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Ordered description of a store's starting state
#[derive(Debug, Clone, Default)]
pub struct InitialState {
    fields: IndexMap<String, Field>,
}

impl InitialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal field
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), Field::Value(value.into()));
        self
    }

    /// Add a computed field
    pub fn computed(
        mut self,
        name: impl Into<String>,
        derive: impl Fn(&State) -> Value + 'static,
    ) -> Self {
        self.fields.insert(name.into(), Field::Computed(Rc::new(derive)));
        self
    }

    /// Literal fields only
    pub fn from_fields(fields: ValueMap) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name, Field::Value(value)))
                .collect(),
        }
    }

    /// Literal fields from a map value
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(Self::from_fields(std::sync::Arc::unwrap_or_clone(map))),
            other => Err(Error::Configuration(format!(
                "initial state must be a map, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Separate literal fields from computed descriptors
    ///
    /// Computed names keep their position in the literal map with a `Null`
    /// placeholder.
    pub fn split(self) -> (ValueMap, IndexMap<String, Derive>) {
        let mut literal = ValueMap::with_capacity(self.fields.len());
        let mut computed = IndexMap::new();
        for (name, field) in self.fields {
            match field {
                Field::Value(value) => {
                    literal.insert(name, value);
                }
                Field::Computed(derive) => {
                    literal.insert(name.clone(), Value::Null);
                    computed.insert(name, derive);
                }
            }
        }
        (literal, computed)
    }
}

impl From<ValueMap> for InitialState {
    fn from(fields: ValueMap) -> Self {
        Self::from_fields(fields)
    }
}
