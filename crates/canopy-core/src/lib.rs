//! Canopy Core - immutable state primitives
//!
//! This crate provides the building blocks every canopy store is made of:
//! - Dynamic, structurally shared values (`Value`, `ValueMap`)
//! - Immutable snapshots (`State`) and identity comparison (`Same`)
//! - The immutable update primitive (`update`, `Setter`, `Draft`)
//! - Memoized selectors (`Selector`, `feature_selector`)
//! - Action envelopes (`Action`, `ActionKind`, `SET_STATE`)
//!
//! canopy-core is standalone: it knows nothing about streams, scheduling
//! or store hierarchies. Those live in `canopy-store`.

mod action;
mod error;
mod same;
mod selector;
mod state;
mod update;
mod value;

pub use action::{Action, ActionKind, SET_STATE};
pub use error::{Error, Result};
pub use same::Same;
pub use selector::{feature_selector, Selector};
pub use state::State;
pub use update::{update, Draft, Setter};
pub use value::{Value, ValueMap};

pub use indexmap::IndexMap;
