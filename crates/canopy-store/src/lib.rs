//! Canopy Store - hierarchical reactive state containers
//!
//! A tree of [`Store`] nodes, each holding an immutable [`State`] snapshot,
//! sharing one [`ActionChannel`] and nesting child state under feature keys.
//!
//! ## Architecture
//!
//! ```text
//! ActionChannel (shared by the whole tree)
//!  │
//!  └── root Store
//!       ├── BehaviorSubject<State> ── coalesce ──► stream()
//!       ├── computed fields (re-derived on every commit)
//!       │
//!       └── child Store ("list")
//!            ├── mirrors its state into root under "list"
//!            └── stream() = root's stream sliced at "list"
//! ```
//!
//! ## Key Components
//!
//! - [`Store`]: a node; reads, writes, subscriptions, destroy
//! - [`StoreBuilder`] and [`StoreConfig`]: explicit or declarative setup
//! - [`InitialState`]: literal and computed starting fields
//! - [`Stream`], [`Subject`], [`BehaviorSubject`]: the push-based plumbing
//! - [`operators`]: `select`, `watch`, `set_state`, `dispatch`, `compute`, ...
//! - [`scheduler`]: the tick queue on which emissions are coalesced
//!
//! ## Threading
//!
//! Stores are single-threaded (`!Send`). Every store of a tree must live on
//! the thread that drives that thread's [`scheduler`].

mod channel;
mod config;
mod error;
mod initial;
pub mod operators;
pub mod scheduler;
mod store;
mod stream;
mod subject;
mod subscription;

pub use channel::ActionChannel;
pub use config::StoreConfig;
pub use error::{Error, Result};
pub use initial::{Derive, Field, InitialState};
pub use store::{HasState, Store, StoreBuilder, StoreLike};
pub use stream::{Observer, Stream};
pub use subject::{BehaviorSubject, Subject};
pub use subscription::{Subscription, SubscriptionSet};

pub use canopy_core::{
    feature_selector, update, Action, ActionKind, Draft, Same, Selector, Setter, State, Value,
    ValueMap, SET_STATE,
};
