//! The store node
//!
//! A [`Store`] owns one current snapshot and exposes it three ways: as a
//! value ([`Store::state`]), as a coalesced stream ([`Store::stream`]) and
//! through the actions it dispatches on the shared [`ActionChannel`].
//!
//! # Hierarchy
//!
//! ```text
//! root Store  ── raw state ──► coalesce ──► distinct ──► root.stream()
//!    ▲   │
//!    │   └──── raw state ──► coalesce ──► slice("list") ──► distinct ──► child.stream()
//!    │
//!    └── set_state({"list": child state})  ◄── child raw state (mirror)
//! ```
//!
//! A child commits upward through one internal subscription and reads
//! downward through its public stream. The two paths never share code: the
//! upward path only writes; the downward path only reads.

use crate::error::{Error, Result};
use crate::initial::Derive;
use crate::operators;
use crate::subject::BehaviorSubject;
use crate::{ActionChannel, InitialState, Stream, StoreConfig, Subscription, SubscriptionSet};
use canopy_core::{feature_selector, update, Action, Same, Selector, Setter, State, ValueMap};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Anything a snapshot can be read from
pub trait HasState {
    fn state(&self) -> State;
}

impl HasState for State {
    fn state(&self) -> State {
        self.clone()
    }
}

/// The store surface the operators work against
pub trait StoreLike: HasState + Clone + 'static {
    fn set_state(&self, setter: Setter);

    fn dispatch(&self, action: Action);

    /// Actions of `kind` on the store's channel
    fn of_action(&self, kind: &str) -> Stream<Action>;

    /// Replay of the current state followed by settled changes
    fn stream(&self) -> Stream<State>;
}

struct StoreInner {
    feature: Option<String>,
    parent: Option<Store>,
    actions: ActionChannel,
    initial: State,
    computed: IndexMap<String, Derive>,
    slice: Option<Selector<State>>,
    state: BehaviorSubject<State>,
    destroyed: BehaviorSubject<bool>,
    internal: SubscriptionSet,
}

/// Re-derive computed fields until none of them changes
///
/// A result that is [`Same`] as, or equal to, the stored value counts as
/// unchanged. Each pass can settle one more link of a chain of computed
/// fields reading each other, so `computed.len() + 1` passes suffice for
/// any acyclic set.
fn settle(computed: &IndexMap<String, Derive>, mut state: State) -> State {
    if computed.is_empty() {
        return state;
    }
    let passes = computed.len() + 1;
    for _ in 0..passes {
        let mut patch = ValueMap::new();
        for (name, derive) in computed {
            let next = derive(&state);
            let unchanged = state
                .get(name)
                .is_some_and(|current| current.same(&next) || *current == next);
            if !unchanged {
                patch.insert(name.clone(), next);
            }
        }
        if patch.is_empty() {
            return state;
        }
        log::trace!("recomputed {} field(s)", patch.len());
        state = update(&state, &Setter::Patch(patch));
    }
    log::warn!("computed fields still changing after {} passes", passes);
    state
}

/// A node in a tree of reactive state containers
///
/// `Store` is a cheap handle; clones refer to the same node.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

/// Builder for stores with explicit wiring
///
/// ```
/// use canopy_store::{scheduler, ActionChannel, InitialState, Store, Value};
///
/// let actions = ActionChannel::new();
/// let root = Store::root(&actions, || InitialState::new().field("items", Value::list(Vec::<Value>::new())));
/// let list = Store::builder()
///     .parent(&root)
///     .feature("list")
///     .initial(|| InitialState::new().field("names", Value::list(Vec::<Value>::new())))
///     .build()
///     .unwrap();
///
/// list.set_state(canopy_store::Setter::field("names", Value::list(vec!["a"])));
/// scheduler::run_until_idle();
///
/// assert_eq!(
///     root.state().get_path(&["list", "names"]),
///     Some(&Value::list(vec!["a"]))
/// );
/// ```
#[derive(Default)]
pub struct StoreBuilder {
    feature: Option<String>,
    parent: Option<Store>,
    actions: Option<ActionChannel>,
    initial: Option<Box<dyn FnOnce() -> InitialState>>,
}

impl StoreBuilder {
    /// Key under which this store's state is nested in the parent
    pub fn feature(mut self, name: impl Into<String>) -> Self {
        self.feature = Some(name.into());
        self
    }

    pub fn parent(mut self, parent: &Store) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Action channel to dispatch on
    ///
    /// Defaults to the parent's channel, or a fresh one for a root store.
    pub fn actions(mut self, actions: &ActionChannel) -> Self {
        self.actions = Some(actions.clone());
        self
    }

    /// Initial-state provider, called once by [`build`](Self::build)
    pub fn initial(mut self, provider: impl FnOnce() -> InitialState + 'static) -> Self {
        self.initial = Some(Box::new(provider));
        self
    }

    /// Take feature key and literal starting state from a config
    pub fn config(mut self, config: &StoreConfig) -> Self {
        if let Some(feature) = &config.feature {
            self.feature = Some(feature.clone());
        }
        let initial = config.initial_state();
        self.initial = Some(Box::new(move || initial));
        self
    }

    pub fn build(self) -> Result<Store> {
        if let Some(feature) = &self.feature {
            if feature.is_empty() {
                return Err(Error::InvalidFeature(feature.clone()));
            }
        }
        if self.parent.is_some() && self.feature.is_none() {
            return Err(Error::MissingFeature);
        }

        let actions = match (self.actions, &self.parent) {
            (Some(actions), _) => actions,
            (None, Some(parent)) => parent.actions().clone(),
            (None, None) => ActionChannel::new(),
        };
        let initial = self.initial.map(|provider| provider()).unwrap_or_default();
        Ok(Store::assemble(self.feature, self.parent, actions, initial))
    }
}

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::default()
    }

    /// Create a root store on `actions`
    pub fn root(actions: &ActionChannel, initial: impl FnOnce() -> InitialState) -> Store {
        Store::assemble(None, None, actions.clone(), initial())
    }

    /// Create a store nested under `feature` in `parent`, sharing its channel
    pub fn child(
        parent: &Store,
        feature: impl Into<String>,
        initial: impl FnOnce() -> InitialState + 'static,
    ) -> Result<Store> {
        Store::builder()
            .parent(parent)
            .feature(feature)
            .initial(initial)
            .build()
    }

    fn assemble(
        feature: Option<String>,
        parent: Option<Store>,
        actions: ActionChannel,
        initial: InitialState,
    ) -> Store {
        let (fields, computed) = initial.split();
        let initial = State::new(fields);
        let current = settle(&computed, initial.clone());
        let slice = match (&parent, &feature) {
            (Some(_), Some(name)) => Some(feature_selector(name.clone())),
            _ => None,
        };

        let store = Store {
            inner: Rc::new(StoreInner {
                feature,
                parent,
                actions,
                initial: initial.clone(),
                computed,
                slice,
                state: BehaviorSubject::new(current),
                destroyed: BehaviorSubject::new(false),
                internal: SubscriptionSet::new(),
            }),
        };
        log::debug!(
            "created store {} ({} field(s), {} computed)",
            store.label(),
            store.inner.initial.len(),
            store.inner.computed.len()
        );

        store.mirror_into_parent();
        store
    }

    /// Commit every local state upward as `{feature: state}`
    fn mirror_into_parent(&self) {
        let (Some(parent), Some(feature)) = (&self.inner.parent, &self.inner.feature) else {
            return;
        };
        let parent = parent.clone();
        let feature = feature.clone();
        let mirror = self.inner.state.as_stream().subscribe(move |state| {
            log::trace!("mirroring {} into parent", feature);
            parent.commit(Setter::field(feature.clone(), state));
        });
        self.inner.internal.push(mirror);
    }

    fn commit(&self, setter: Setter) {
        if self.is_destroyed() {
            log::warn!("ignoring set_state on destroyed store {}", self.label());
            return;
        }
        let next = update(&self.inner.state.value(), &setter);
        let next = settle(&self.inner.computed, next);
        log::trace!("store {} committed {:?}", self.label(), setter);
        let actions = &self.inner.actions;
        self.inner
            .state
            .commit(next, |state| actions.dispatch(Action::set_state(state)));
    }

    fn label(&self) -> &str {
        self.inner.feature.as_deref().unwrap_or("<root>")
    }

    /// The current snapshot
    pub fn state(&self) -> State {
        self.inner.state.value()
    }

    pub fn get_state(&self) -> State {
        self.state()
    }

    /// The snapshot this store was created with, computed fields unset
    pub fn initial_state(&self) -> State {
        self.inner.initial.clone()
    }

    pub fn feature(&self) -> Option<&str> {
        self.inner.feature.as_deref()
    }

    pub fn parent(&self) -> Option<&Store> {
        self.inner.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn actions(&self) -> &ActionChannel {
        &self.inner.actions
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.value()
    }

    /// Apply `setter`, publish the result and dispatch `SET_STATE`
    ///
    /// Computed fields are re-derived before anything is published, so the
    /// dispatched snapshot is already consistent. Subscribers to
    /// [`stream`](Self::stream) see the result at the next scheduler tick;
    /// [`state`](Self::state) reflects it immediately.
    ///
    /// On a child store the whole local state is merged into the parent
    /// under the feature key. Writes the parent made to that slice directly
    /// are not part of the local state and are overwritten by the next
    /// local write.
    pub fn set_state(&self, setter: impl Into<Setter>) {
        self.commit(setter.into());
    }

    /// Push an action onto the shared channel
    pub fn dispatch(&self, action: impl Into<Action>) {
        self.inner.actions.dispatch(action);
    }

    /// Actions of `kind` dispatched anywhere in the tree
    pub fn of_action(&self, kind: &str) -> Stream<Action> {
        self.inner.actions.of_kind(kind)
    }

    /// The current state, then one emission per tick with a distinct state
    ///
    /// A root store follows its own commits. A child follows its slice of
    /// the parent, so it only sees a local write once it has landed in the
    /// parent. A child whose parent is already destroyed when the stream is
    /// subscribed follows its own commits instead. The stream ends when the
    /// store is destroyed.
    pub fn stream(&self) -> Stream<State> {
        let settled = match (&self.inner.parent, &self.inner.slice) {
            (Some(parent), Some(slice)) => {
                let parent = parent.clone();
                let slice = slice.clone();
                let local = self.inner.state.clone();
                Stream::new(move |observer| {
                    let source = if parent.is_destroyed() {
                        local.as_stream().coalesce()
                    } else {
                        let slice = slice.clone();
                        parent
                            .inner
                            .state
                            .as_stream()
                            .coalesce()
                            .map(move |state| slice.call(&state))
                    };
                    source.distinct_until_changed().subscribe_observer(observer)
                })
            }
            _ => self
                .inner
                .state
                .as_stream()
                .coalesce()
                .distinct_until_changed(),
        };
        settled.take_until(self.inner.destroyed.as_stream().filter(|destroyed| *destroyed))
    }

    pub fn subscribe(&self, next: impl Fn(State) + 'static) -> Subscription {
        self.stream().subscribe(next)
    }

    /// Derived values of the state, without consecutive repeats
    pub fn select<R>(&self, selector: impl Into<Selector<R>>) -> Stream<R>
    where
        R: Same + Clone + 'static,
    {
        self.stream().pipe(operators::select(selector))
    }

    /// Like [`select`](Self::select) without the current value
    pub fn watch<R>(&self, selector: impl Into<Selector<R>>) -> Stream<R>
    where
        R: Same + Clone + 'static,
    {
        self.stream().pipe(operators::watch(selector))
    }

    /// Stop all emissions and release internal subscriptions
    ///
    /// Streams obtained from this store end, computed fields stop
    /// recomputing and a child stops mirroring into its parent. Calling it
    /// again does nothing.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        log::debug!("destroying store {}", self.label());
        self.inner.destroyed.next(true);
        self.inner.state.complete();
        self.inner.internal.clear();
    }
}

impl HasState for Store {
    fn state(&self) -> State {
        Store::state(self)
    }
}

impl StoreLike for Store {
    fn set_state(&self, setter: Setter) {
        self.commit(setter);
    }

    fn dispatch(&self, action: Action) {
        self.inner.actions.dispatch(action);
    }

    fn of_action(&self, kind: &str) -> Stream<Action> {
        Store::of_action(self, kind)
    }

    fn stream(&self) -> Stream<State> {
        Store::stream(self)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("feature", &self.inner.feature)
            .field("root", &self.is_root())
            .field("state", &self.state())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler;
    use canopy_core::{Value, SET_STATE};
    use std::cell::RefCell;

    fn collect<T: Clone + 'static>(stream: Stream<T>) -> (Rc<RefCell<Vec<T>>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = stream.subscribe(move |v| sink.borrow_mut().push(v));
        (seen, sub)
    }

    fn int(state: &State, key: &str) -> Option<i64> {
        state.get(key).and_then(Value::as_int)
    }

    fn counter(actions: &ActionChannel) -> Store {
        Store::root(actions, || {
            InitialState::new()
                .field("count", 0i64)
                .computed("doubled", |s| Value::Int(int(s, "count").unwrap_or(0) * 2))
        })
    }

    fn empty_list() -> Value {
        Value::list(Vec::<Value>::new())
    }

    #[test]
    fn test_computed_field_is_seeded_at_construction() {
        let store = counter(&ActionChannel::new());
        assert_eq!(store.initial_state().get("doubled"), Some(&Value::Null));
        assert_eq!(int(&store.state(), "doubled"), Some(0));
    }

    #[test]
    fn test_computed_field_follows_updates() {
        let store = counter(&ActionChannel::new());
        store.set_state(Setter::field("count", 3i64));

        let state = store.state();
        assert_eq!(int(&state, "count"), Some(3));
        assert_eq!(int(&state, "doubled"), Some(6));
    }

    #[test]
    fn test_subscribe_replays_synchronously_and_waits_for_change() {
        let store = counter(&ActionChannel::new());
        let (seen, _sub) = collect(store.stream());

        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].ptr_eq(&store.state()));

        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 1);

        store.set_state(Setter::field("count", 0i64));
        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_same_tick_writes_emit_once_with_final_value() {
        let store = Store::root(&ActionChannel::new(), || InitialState::new().field("count", 0i64));
        let (seen, _sub) = collect(store.stream());

        store.set_state(Setter::field("count", 1i64));
        store.set_state(Setter::recipe(|draft| {
            let count = draft.get("count").and_then(Value::as_int).unwrap_or(0);
            draft.set("count", count + 10);
        }));
        assert_eq!(seen.borrow().len(), 1);

        scheduler::run_until_idle();
        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(int(&seen[1], "count"), Some(11));
    }

    #[test]
    fn test_observers_see_computed_value_with_the_change() {
        let store = counter(&ActionChannel::new());
        let (seen, _sub) = collect(store.stream());

        store.set_state(Setter::field("count", 3i64));
        scheduler::run_until_idle();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(int(&seen[1], "count"), Some(3));
        assert_eq!(int(&seen[1], "doubled"), Some(6));
    }

    #[test]
    fn test_unchanged_derivation_adds_no_commit() {
        let actions = ActionChannel::new();
        let store = Store::root(&actions, || {
            InitialState::new()
                .field("count", 1i64)
                .field("label", "a")
                .computed("positive", |s| Value::Bool(int(s, "count").unwrap_or(0) > 0))
        });
        let (commits, _sub) = collect(actions.of_kind(SET_STATE));

        store.set_state(Setter::field("label", "b"));
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_fresh_compound_derivation_terminates() {
        let store = Store::root(&ActionChannel::new(), || {
            InitialState::new()
                .field("count", 1i64)
                .computed("pair", |s| Value::list(vec![int(s, "count").unwrap_or(0); 2]))
        });
        store.set_state(Setter::field("count", 2i64));
        assert_eq!(store.state().get("pair"), Some(&Value::list(vec![2i64, 2])));
    }

    #[test]
    fn test_set_state_actions_in_commit_order() {
        let actions = ActionChannel::new();
        let store = counter(&actions);
        let (commits, _sub) = collect(store.of_action(SET_STATE));

        store.set_state(Setter::field("count", 1i64));
        store.set_state(Setter::field("count", 2i64));

        let payloads: Vec<(Option<i64>, Option<i64>)> = commits
            .borrow()
            .iter()
            .map(|a| {
                let s = a.set_state_payload().unwrap();
                (int(&s, "count"), int(&s, "doubled"))
            })
            .collect();
        assert_eq!(
            payloads,
            vec![(Some(1), Some(2)), (Some(2), Some(4))]
        );
        let last = commits.borrow().last().unwrap().set_state_payload().unwrap();
        assert!(last.ptr_eq(&store.state()));
    }

    #[test]
    fn test_chained_computed_fields_settle_in_one_commit() {
        let actions = ActionChannel::new();
        let store = Store::root(&actions, || {
            InitialState::new()
                .field("count", 1i64)
                .computed("quadrupled", |s| Value::Int(int(s, "doubled").unwrap_or(0) * 2))
                .computed("doubled", |s| Value::Int(int(s, "count").unwrap_or(0) * 2))
        });
        assert_eq!(int(&store.state(), "quadrupled"), Some(4));

        let (commits, _sub) = collect(actions.of_kind(SET_STATE));
        store.set_state(Setter::field("count", 3i64));

        let commits = commits.borrow();
        assert_eq!(commits.len(), 1);
        let payload = commits[0].set_state_payload().unwrap();
        assert_eq!(int(&payload, "doubled"), Some(6));
        assert_eq!(int(&payload, "quadrupled"), Some(12));
    }

    #[test]
    fn test_child_state_is_merged_into_parent() {
        let root = Store::root(&ActionChannel::new(), || InitialState::new().field("items", empty_list()));
        let child = Store::child(&root, "list", || InitialState::new().field("names", empty_list())).unwrap();

        assert_eq!(root.state().get("list"), Some(&child.state().to_value()));

        child.set_state(Setter::field("names", Value::list(vec!["a"])));
        scheduler::run_until_idle();

        assert_eq!(
            root.state().get_path(&["list", "names"]),
            Some(&Value::list(vec!["a"]))
        );
        assert_eq!(root.state().get("list"), Some(&child.state().to_value()));
        assert_eq!(root.state().get("items"), Some(&empty_list()));
    }

    #[test]
    fn test_child_stream_follows_parent_slice() {
        let root = Store::root(&ActionChannel::new(), || InitialState::new().field("other", 0i64));
        let child = Store::child(&root, "list", || InitialState::new().field("n", 0i64)).unwrap();
        let (seen, _sub) = collect(child.stream());
        assert_eq!(int(&seen.borrow()[0], "n"), Some(0));

        root.set_state(Setter::field("other", 1i64));
        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 1);

        child.set_state(Setter::field("n", 5i64));
        assert_eq!(seen.borrow().len(), 1);
        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(int(&seen.borrow()[1], "n"), Some(5));
    }

    #[test]
    fn test_child_stream_reflects_parent_writes_to_slice() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let child = Store::child(&root, "list", || InitialState::new().field("n", 0i64)).unwrap();
        let (seen, _sub) = collect(child.stream());

        root.set_state(Setter::field("list", Value::map([("n", 9i64)])));
        scheduler::run_until_idle();

        assert_eq!(int(seen.borrow().last().unwrap(), "n"), Some(9));
    }

    #[test]
    fn test_child_with_computed_field_emits_once_per_tick() {
        let actions = ActionChannel::new();
        let root = Store::root(&actions, InitialState::new);
        let child = Store::child(&root, "list", || {
            InitialState::new()
                .field("n", 0i64)
                .computed("d", |s| Value::Int(int(s, "n").unwrap_or(0) * 2))
        })
        .unwrap();
        let (root_seen, _a) = collect(root.stream());
        let (child_seen, _b) = collect(child.stream());
        let (commits, _c) = collect(actions.of_kind(SET_STATE));

        child.set_state(Setter::field("n", 5i64));
        scheduler::run_until_idle();

        assert_eq!(root_seen.borrow().len(), 2);
        assert_eq!(child_seen.borrow().len(), 2);
        assert_eq!(
            root.state().get("list"),
            Some(&Value::map([("n", 5i64), ("d", 10i64)]))
        );
        assert_eq!(int(&child_seen.borrow()[1], "d"), Some(10));
        for action in commits.borrow().iter() {
            let payload = action.set_state_payload().unwrap();
            let slice = payload.get("list").cloned().map(State::try_from);
            let local = match slice {
                Some(Ok(slice)) => slice,
                _ => payload,
            };
            assert_eq!(int(&local, "d"), int(&local, "n").map(|n| n * 2));
        }
        assert_eq!(commits.borrow().len(), 2);
    }

    #[test]
    fn test_local_write_overwrites_parent_slice_edit() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let child = Store::child(&root, "list", || InitialState::new().field("n", 0i64)).unwrap();
        let (seen, _sub) = collect(child.stream());

        root.set_state(Setter::field("list", Value::map([("n", 9i64)])));
        scheduler::run_until_idle();
        assert_eq!(int(seen.borrow().last().unwrap(), "n"), Some(9));
        assert_eq!(int(&child.state(), "n"), Some(0));

        child.set_state(Setter::field("x", 0i64));
        assert_eq!(root.state().get_path(&["list", "n"]), Some(&Value::Int(0)));
        assert_eq!(root.state().get_path(&["list", "x"]), Some(&Value::Int(0)));
    }

    #[test]
    fn test_child_of_destroyed_parent_follows_local_state() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let child = Store::child(&root, "c", || InitialState::new().field("n", 1i64)).unwrap();
        root.destroy();

        let (seen, _sub) = collect(child.stream());
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(int(&seen.borrow()[0], "n"), Some(1));

        child.set_state(Setter::field("n", 2i64));
        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(int(&seen.borrow()[1], "n"), Some(2));
    }

    #[test]
    fn test_grandchild_propagates_to_root() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let mid = Store::child(&root, "mid", InitialState::new).unwrap();
        let leaf = Store::child(&mid, "leaf", || InitialState::new().field("x", 0i64)).unwrap();

        leaf.set_state(Setter::field("x", 1i64));
        assert_eq!(
            root.state().get_path(&["mid", "leaf", "x"]),
            Some(&Value::Int(1))
        );
    }

    #[test]
    fn test_child_shares_parent_channel() {
        let actions = ActionChannel::new();
        let root = Store::root(&actions, InitialState::new);
        let child = Store::child(&root, "c", InitialState::new).unwrap();
        let (seen, _sub) = collect(actions.of_kind("PING"));

        child.dispatch(Action::kind_only("PING"));
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_child_requires_feature() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let err = Store::builder().parent(&root).build().unwrap_err();
        assert!(matches!(err, Error::MissingFeature));
        assert!(err.is_configuration());

        let err = Store::child(&root, "", InitialState::new).unwrap_err();
        assert!(matches!(err, Error::InvalidFeature(_)));
    }

    #[test]
    fn test_builder_from_config() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let config = StoreConfig::from_ron(r#"(feature: Some("prefs"), state: {"theme": String("dark")})"#).unwrap();
        let prefs = Store::builder().parent(&root).config(&config).build().unwrap();

        assert_eq!(prefs.feature(), Some("prefs"));
        assert_eq!(
            root.state().get_path(&["prefs", "theme"]),
            Some(&Value::from("dark"))
        );
    }

    #[test]
    fn test_destroy_stops_streams_and_writes() {
        let store = counter(&ActionChannel::new());
        let (seen, _sub) = collect(store.stream());

        store.set_state(Setter::field("count", 1i64));
        store.destroy();
        scheduler::run_until_idle();
        assert_eq!(seen.borrow().len(), 1);

        store.set_state(Setter::field("count", 2i64));
        assert_eq!(int(&store.state(), "count"), Some(1));
        assert!(store.is_destroyed());

        let (late, _late_sub) = collect(store.stream());
        assert!(late.borrow().is_empty());
    }

    #[test]
    fn test_destroyed_child_stops_mirroring() {
        let root = Store::root(&ActionChannel::new(), InitialState::new);
        let child = Store::child(&root, "c", || InitialState::new().field("n", 0i64)).unwrap();
        let (seen, _sub) = collect(child.stream());

        child.destroy();
        child.set_state(Setter::field("n", 1i64));
        root.set_state(Setter::field("c", Value::map([("n", 2i64)])));
        scheduler::run_until_idle();

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(root.state().get_path(&["c", "n"]), Some(&Value::Int(2)));
        assert_eq!(root.inner.state.observer_count(), 0);
    }

    #[test]
    fn test_select_and_watch() {
        let store = counter(&ActionChannel::new());
        let (selected, _a) = collect(store.select(|s: &State| int(s, "doubled")));
        let (watched, _b) = collect(store.watch(|s: &State| int(s, "doubled")));

        store.set_state(Setter::field("count", 2i64));
        scheduler::run_until_idle();

        assert_eq!(*selected.borrow(), vec![Some(0), Some(4)]);
        assert_eq!(*watched.borrow(), vec![Some(4)]);
    }
}
