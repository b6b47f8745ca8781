//! Memoized selectors
//!
//! A [`Selector`] caches its last input/output pair. Called again with the
//! same snapshot (by identity) it hands back the cached output without
//! running the projection, which keeps derived compound values identical
//! across calls and lets distinct-suppression downstream do its job.

use crate::{State, Value};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct SelectorInner<R> {
    project: Box<dyn Fn(&State) -> R>,
    cache: RefCell<Option<(State, R)>>,
    evaluations: Cell<usize>,
}

/// A pure projection from state with a single-entry cache
pub struct Selector<R> {
    inner: Rc<SelectorInner<R>>,
}

impl<R: Clone + 'static> Selector<R> {
    pub fn new(project: impl Fn(&State) -> R + 'static) -> Self {
        Self {
            inner: Rc::new(SelectorInner {
                project: Box::new(project),
                cache: RefCell::new(None),
                evaluations: Cell::new(0),
            }),
        }
    }

    /// Project `state`, reusing the cached result for the same snapshot
    pub fn call(&self, state: &State) -> R {
        if let Some((input, output)) = self.inner.cache.borrow().as_ref() {
            if input.ptr_eq(state) {
                return output.clone();
            }
        }
        let output = (self.inner.project)(state);
        self.inner.evaluations.set(self.inner.evaluations.get() + 1);
        *self.inner.cache.borrow_mut() = Some((state.clone(), output.clone()));
        output
    }

    /// How many times the projection actually ran
    pub fn evaluations(&self) -> usize {
        self.inner.evaluations.get()
    }
}

impl<R> Clone for Selector<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for Selector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("evaluations", &self.inner.evaluations.get())
            .finish_non_exhaustive()
    }
}

impl<R, F> From<F> for Selector<R>
where
    R: Clone + 'static,
    F: Fn(&State) -> R + 'static,
{
    fn from(project: F) -> Self {
        Selector::new(project)
    }
}

/// Selector for the slice of state stored under `name`
///
/// Missing keys and non-map values both yield the shared empty snapshot.
pub fn feature_selector(name: impl Into<String>) -> Selector<State> {
    let name = name.into();
    Selector::new(move |state: &State| match state.get(&name) {
        Some(Value::Map(slice)) => State::from_arc(slice.clone()),
        _ => State::empty(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{update, Same, Setter, ValueMap};

    fn state(count: i64) -> State {
        State::new(ValueMap::from_iter([("count".to_string(), Value::Int(count))]))
    }

    #[test]
    fn test_cache_hit_for_same_input() {
        let doubled = Selector::new(|s: &State| Value::list(vec![s.get("count").cloned().unwrap_or_default()]));
        let input = state(2);

        let first = doubled.call(&input);
        let second = doubled.call(&input);

        assert!(first.same(&second));
        assert_eq!(doubled.evaluations(), 1);
    }

    #[test]
    fn test_equal_but_distinct_input_recomputes() {
        let count = Selector::new(|s: &State| s.get("count").cloned());
        count.call(&state(1));
        count.call(&state(1));
        assert_eq!(count.evaluations(), 2);
    }

    #[test]
    fn test_clones_share_cache() {
        let selector = Selector::new(|s: &State| s.len());
        let clone = selector.clone();
        let input = state(1);
        selector.call(&input);
        clone.call(&input);
        assert_eq!(selector.evaluations(), 1);
    }

    #[test]
    fn test_feature_selector_extracts_and_defaults() {
        let list = feature_selector("list");
        let root = update(
            &State::empty(),
            &Setter::field("list", Value::map([("names", Value::list(vec!["a"]))])),
        );

        let slice = list.call(&root);
        assert_eq!(slice.get("names"), Some(&Value::list(vec!["a"])));
        assert!(slice.to_value().same(root.get("list").unwrap()));

        let missing = list.call(&state(0));
        assert!(missing.ptr_eq(&State::empty()));
    }
}
