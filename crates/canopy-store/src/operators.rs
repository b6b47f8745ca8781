//! Pipeable stream operators over stores
//!
//! Every operator returns a function from one [`Stream`] to another and is
//! applied with [`Stream::pipe`]. Most come in two forms:
//!
//! - a *bound* form working on a stream of stores, which acts on each
//!   emitted store (`set_state`, `dispatch`, `to_state`, ...);
//! - an *unbound* form taking an explicit store, which passes arbitrary
//!   events through and acts on that store (`set_state_on`, `dispatch_to`,
//!   `to_state_of`, ...).
//!
//! ```
//! use canopy_store::operators::{select, set_state_on};
//! use canopy_store::{scheduler, ActionChannel, InitialState, Setter, State, Store, Subject};
//!
//! let store = Store::root(&ActionChannel::new(), || InitialState::new().field("count", 0i64));
//! let clicks: Subject<i64> = Subject::new();
//! let _sub = clicks
//!     .as_stream()
//!     .pipe(set_state_on(&store, |n: &i64| Setter::field("count", *n)))
//!     .subscribe(|_| {});
//!
//! clicks.next(3);
//! scheduler::run_until_idle();
//! assert_eq!(store.state().get("count").and_then(|v| v.as_int()), Some(3));
//!
//! let counts = store
//!     .stream()
//!     .pipe(select(|s: &State| s.get("count").and_then(|v| v.as_int())));
//! let _counts = counts.subscribe(|count| assert_eq!(count, Some(3)));
//! ```

use crate::store::{HasState, StoreLike};
use crate::Stream;
use canopy_core::{Action, Same, Selector, Setter, State};
use std::fmt;
use std::rc::Rc;

/// A setter given up front, or built from each value flowing through
pub enum SetterSource<E> {
    Fixed(Setter),
    Factory(Rc<dyn Fn(&E) -> Setter>),
}

impl<E> SetterSource<E> {
    pub fn resolve(&self, context: &E) -> Setter {
        match self {
            SetterSource::Fixed(setter) => setter.clone(),
            SetterSource::Factory(factory) => factory(context),
        }
    }
}

impl<E> From<Setter> for SetterSource<E> {
    fn from(setter: Setter) -> Self {
        SetterSource::Fixed(setter)
    }
}

impl<E, F> From<F> for SetterSource<E>
where
    F: Fn(&E) -> Setter + 'static,
{
    fn from(factory: F) -> Self {
        SetterSource::Factory(Rc::new(factory))
    }
}

impl<E> fmt::Debug for SetterSource<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetterSource::Fixed(setter) => f.debug_tuple("Fixed").field(setter).finish(),
            SetterSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// An action given up front, or built from each value flowing through
pub enum ActionSource<E> {
    Fixed(Action),
    Factory(Rc<dyn Fn(&E) -> Action>),
}

impl<E> ActionSource<E> {
    pub fn resolve(&self, context: &E) -> Action {
        match self {
            ActionSource::Fixed(action) => action.clone(),
            ActionSource::Factory(factory) => factory(context),
        }
    }
}

impl<E> From<Action> for ActionSource<E> {
    fn from(action: Action) -> Self {
        ActionSource::Fixed(action)
    }
}

impl<E, F> From<F> for ActionSource<E>
where
    F: Fn(&E) -> Action + 'static,
{
    fn from(factory: F) -> Self {
        ActionSource::Factory(Rc::new(factory))
    }
}

/// Project each state through `selector`, dropping consecutive repeats
pub fn select<S, R>(selector: impl Into<Selector<R>>) -> impl FnOnce(Stream<S>) -> Stream<R>
where
    S: HasState + Clone + 'static,
    R: Same + Clone + 'static,
{
    let selector = selector.into();
    move |source| {
        source
            .map(move |item| selector.call(&item.state()))
            .distinct_until_changed()
    }
}

/// [`select`] without the first emission
pub fn watch<S, R>(selector: impl Into<Selector<R>>) -> impl FnOnce(Stream<S>) -> Stream<R>
where
    S: HasState + Clone + 'static,
    R: Same + Clone + 'static,
{
    let select = select(selector);
    move |source| select(source).skip(1)
}

/// Dispatch an action through each emitted store
pub fn dispatch<S>(action: impl Into<ActionSource<S>>) -> impl FnOnce(Stream<S>) -> Stream<S>
where
    S: StoreLike,
{
    let action = action.into();
    move |source| source.tap(move |store| store.dispatch(action.resolve(store)))
}

/// Dispatch an action on `store` for each event
pub fn dispatch_to<E, S>(
    store: &S,
    action: impl Into<ActionSource<E>>,
) -> impl FnOnce(Stream<E>) -> Stream<E>
where
    E: Clone + 'static,
    S: StoreLike,
{
    let store = store.clone();
    let action = action.into();
    move |source| source.tap(move |event| store.dispatch(action.resolve(event)))
}

/// Apply a setter to each emitted store
pub fn set_state<S>(setter: impl Into<SetterSource<S>>) -> impl FnOnce(Stream<S>) -> Stream<S>
where
    S: StoreLike,
{
    let setter = setter.into();
    move |source| source.tap(move |store| store.set_state(setter.resolve(store)))
}

/// Apply a setter to `store` for each event, the event as context
pub fn set_state_on<E, S>(
    store: &S,
    setter: impl Into<SetterSource<E>>,
) -> impl FnOnce(Stream<E>) -> Stream<E>
where
    E: Clone + 'static,
    S: StoreLike,
{
    let store = store.clone();
    let setter = setter.into();
    move |source| source.tap(move |event| store.set_state(setter.resolve(event)))
}

/// Replace each emitted store with its current state
pub fn to_state<S>() -> impl FnOnce(Stream<S>) -> Stream<State>
where
    S: HasState + Clone + 'static,
{
    |source| source.map(|item| item.state())
}

/// Replace each event with the current state of `store`
pub fn to_state_of<E, S>(store: &S) -> impl FnOnce(Stream<E>) -> Stream<State>
where
    E: Clone + 'static,
    S: HasState + Clone + 'static,
{
    let store = store.clone();
    move |source| source.map(move |_| store.state())
}

/// Pair each emitted store with its current state
pub fn with_latest_state<S>() -> impl FnOnce(Stream<S>) -> Stream<(S, State)>
where
    S: HasState + Clone + 'static,
{
    |source| {
        source.map(|item| {
            let state = item.state();
            (item, state)
        })
    }
}

/// Pair each event with the current state of `store`
pub fn with_latest_state_of<E, S>(store: &S) -> impl FnOnce(Stream<E>) -> Stream<(E, State)>
where
    E: Clone + 'static,
    S: HasState + Clone + 'static,
{
    let store = store.clone();
    move |source| source.map(move |event| (event, store.state()))
}

/// Pair each event with `store`
pub fn with_store_like<E, S>(store: &S) -> impl FnOnce(Stream<E>) -> Stream<(E, S)>
where
    E: Clone + 'static,
    S: Clone + 'static,
{
    let store = store.clone();
    move |source| source.map(move |event| (event, store.clone()))
}

/// Actions of `kind` from the first emitted store's channel
pub fn of_action<S>(kind: impl Into<String>) -> impl FnOnce(Stream<S>) -> Stream<Action>
where
    S: StoreLike,
{
    let kind = kind.into();
    move |source| source.take(1).switch_map(move |store| store.of_action(&kind))
}

/// Actions of `kind` from the channel of `store`, ignoring the source
pub fn of_action_on<E, S>(store: &S, kind: impl Into<String>) -> impl FnOnce(Stream<E>) -> Stream<Action>
where
    E: Clone + 'static,
    S: StoreLike,
{
    let store = store.clone();
    let kind = kind.into();
    move |_source| store.of_action(&kind)
}

/// Keep a piece of state in sync with a derived value
///
/// Selects from the store's stream and, for every distinct result, applies
/// the setter built from it. The returned stream emits the selected values;
/// nothing happens until it is subscribed.
pub fn compute<S, R>(
    selector: impl Into<Selector<R>>,
    setter: impl Fn(&R) -> Setter + 'static,
) -> impl FnOnce(S) -> Stream<R>
where
    S: StoreLike,
    R: Same + Clone + 'static,
{
    let selector = selector.into();
    move |store| {
        let source: SetterSource<R> = SetterSource::Factory(Rc::new(setter));
        store
            .stream()
            .pipe(select(selector))
            .pipe(set_state_on(&store, source))
    }
}
