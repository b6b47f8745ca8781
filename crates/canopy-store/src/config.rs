//! Store configuration
//!
//! [`StoreConfig`] is the declarative half of a store's setup: where it is
//! nested and what literal state it starts from. It can be written in code
//! or loaded from RON. Computed fields are code and are added on the
//! [`InitialState`] it produces.
//!
//! ```
//! use canopy_store::StoreConfig;
//!
//! let config = StoreConfig::from_ron(r#"(
//!     feature: Some("list"),
//!     state: {"names": List([])},
//! )"#).unwrap();
//!
//! assert_eq!(config.feature.as_deref(), Some("list"));
//! assert_eq!(config.state.len(), 1);
//! ```

use crate::error::Result;
use crate::InitialState;
use canopy_core::{Value, ValueMap};
use serde::{Deserialize, Serialize};

/// Declarative setup of one store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key under which the store's state is nested in its parent
    ///
    /// Required when the store has a parent, ignored otherwise.
    #[serde(default)]
    pub feature: Option<String>,
    /// Literal starting fields
    #[serde(default)]
    pub state: ValueMap,
}

impl StoreConfig {
    /// Configuration for a root store
    pub fn root() -> Self {
        Self::default()
    }

    /// Configuration for a store nested under `name`
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            feature: Some(name.into()),
            state: ValueMap::new(),
        }
    }

    /// Add a literal starting field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.state.insert(name.into(), value.into());
        self
    }

    /// Parse a configuration from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Literal starting fields as an initial-state descriptor
    pub fn initial_state(&self) -> InitialState {
        InitialState::from_fields(self.state.clone())
    }
}
