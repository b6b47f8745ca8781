//! Push-based streams
//!
//! A [`Stream`] is cold: nothing happens until it is subscribed, and every
//! subscription runs its own copy of the pipeline. Combinators wrap the
//! upstream subscribe function; the returned [`Subscription`] tears down
//! the whole chain.

use crate::scheduler;
use crate::Subscription;
use canopy_core::Same;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Receiver of stream values
pub type Observer<T> = Rc<dyn Fn(T)>;

type SubscribeFn<T> = Rc<dyn Fn(Observer<T>) -> Subscription>;

/// A cold, push-based stream of values
pub struct Stream<T> {
    subscribe_fn: SubscribeFn<T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Create a stream from a subscribe function
    pub fn new(subscribe: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe),
        }
    }

    /// A stream that emits `values` synchronously on subscribe
    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        let values: Rc<Vec<T>> = Rc::new(values.into_iter().collect());
        Stream::new(move |observer| {
            for value in values.iter() {
                observer(value.clone());
            }
            Subscription::empty()
        })
    }

    /// A stream that never emits
    pub fn empty() -> Self {
        Stream::new(|_| Subscription::empty())
    }

    pub fn subscribe(&self, next: impl Fn(T) + 'static) -> Subscription {
        self.subscribe_observer(Rc::new(next))
    }

    pub fn subscribe_observer(&self, observer: Observer<T>) -> Subscription {
        (self.subscribe_fn)(observer)
    }

    /// Apply an operator
    pub fn pipe<U>(self, operator: impl FnOnce(Stream<T>) -> Stream<U>) -> Stream<U> {
        operator(self)
    }

    pub fn map<U: Clone + 'static>(self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            self.subscribe(move |value| observer(f(value)))
        })
    }

    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let predicate = Rc::new(predicate);
        Stream::new(move |observer: Observer<T>| {
            let predicate = Rc::clone(&predicate);
            self.subscribe(move |value| {
                if predicate(&value) {
                    observer(value);
                }
            })
        })
    }

    /// Run a side effect for each value, passing it through unchanged
    pub fn tap(self, effect: impl Fn(&T) + 'static) -> Stream<T> {
        let effect = Rc::new(effect);
        Stream::new(move |observer: Observer<T>| {
            let effect = Rc::clone(&effect);
            self.subscribe(move |value| {
                effect(&value);
                observer(value);
            })
        })
    }

    /// Drop values equal to the previous one according to `eq`
    pub fn distinct_by(self, eq: impl Fn(&T, &T) -> bool + 'static) -> Stream<T> {
        let eq = Rc::new(eq);
        Stream::new(move |observer: Observer<T>| {
            let eq = Rc::clone(&eq);
            let last: RefCell<Option<T>> = RefCell::new(None);
            self.subscribe(move |value| {
                let changed = {
                    let mut last = last.borrow_mut();
                    match last.as_ref() {
                        Some(previous) if eq(previous, &value) => false,
                        _ => {
                            *last = Some(value.clone());
                            true
                        }
                    }
                };
                if changed {
                    observer(value);
                }
            })
        })
    }

    /// Drop values that are [`Same`] as the previous one
    pub fn distinct_until_changed(self) -> Stream<T>
    where
        T: Same,
    {
        self.distinct_by(|a, b| a.same(b))
    }

    pub fn skip(self, count: usize) -> Stream<T> {
        Stream::new(move |observer: Observer<T>| {
            let remaining = Cell::new(count);
            self.subscribe(move |value| {
                let left = remaining.get();
                if left > 0 {
                    remaining.set(left - 1);
                    return;
                }
                observer(value);
            })
        })
    }

    /// Emit at most `count` values, then let go of the upstream
    pub fn take(self, count: usize) -> Stream<T> {
        Stream::new(move |observer: Observer<T>| {
            if count == 0 {
                return Subscription::empty();
            }
            let remaining = Rc::new(Cell::new(count));
            let upstream: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

            let left = Rc::clone(&remaining);
            let slot = Rc::clone(&upstream);
            let subscription = self.subscribe(move |value| {
                let n = left.get();
                if n == 0 {
                    return;
                }
                left.set(n - 1);
                observer(value);
                if n == 1 {
                    let taken = slot.borrow_mut().take();
                    drop(taken);
                }
            });

            if remaining.get() == 0 {
                drop(subscription);
                return Subscription::empty();
            }
            *upstream.borrow_mut() = Some(subscription);
            Subscription::new(move || {
                let taken = upstream.borrow_mut().take();
                drop(taken);
            })
        })
    }

    /// Map each value to an inner stream, following only the latest one
    pub fn switch_map<U: Clone + 'static>(
        self,
        project: impl Fn(T) -> Stream<U> + 'static,
    ) -> Stream<U> {
        let project = Rc::new(project);
        Stream::new(move |observer: Observer<U>| {
            let inner: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
            let slot = Rc::clone(&inner);
            let project = Rc::clone(&project);
            let mut subscription = self.subscribe(move |value| {
                let previous = slot.borrow_mut().take();
                drop(previous);
                let next = project(value).subscribe_observer(Rc::clone(&observer));
                *slot.borrow_mut() = Some(next);
            });
            subscription.add_teardown(move || {
                let taken = inner.borrow_mut().take();
                drop(taken);
            });
            subscription
        })
    }

    /// Mirror this stream until `notifier` emits
    pub fn take_until<N: Clone + 'static>(self, notifier: Stream<N>) -> Stream<T> {
        Stream::new(move |observer: Observer<T>| {
            let done = Rc::new(Cell::new(false));
            let upstream: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

            let stop_done = Rc::clone(&done);
            let stop_slot = Rc::clone(&upstream);
            let mut subscription = notifier.subscribe(move |_| {
                if stop_done.replace(true) {
                    return;
                }
                let taken = stop_slot.borrow_mut().take();
                drop(taken);
            });
            if done.get() {
                return subscription;
            }

            let gate = Rc::clone(&done);
            let source = self.subscribe(move |value| {
                if !gate.get() {
                    observer(value);
                }
            });
            if done.get() {
                drop(source);
            } else {
                *upstream.borrow_mut() = Some(source);
            }
            subscription.add_teardown(move || {
                let taken = upstream.borrow_mut().take();
                drop(taken);
            });
            subscription
        })
    }

    /// Collapse bursts of values into one emission per scheduler tick
    ///
    /// The first value after subscribing (the replay of a state stream)
    /// passes through synchronously. Every later value is held; only the
    /// latest one held is delivered when the scheduler next drains.
    pub fn coalesce(self) -> Stream<T> {
        Stream::new(move |observer: Observer<T>| {
            let state = Rc::new(Coalesce {
                latest: RefCell::new(None),
                primed: Cell::new(false),
                scheduled: Cell::new(false),
                active: Cell::new(true),
            });

            let shared = Rc::clone(&state);
            let mut subscription = self.subscribe(move |value| {
                if !shared.primed.replace(true) {
                    observer(value);
                    return;
                }
                *shared.latest.borrow_mut() = Some(value);
                if shared.scheduled.replace(true) {
                    return;
                }
                let task_state = Rc::clone(&shared);
                let task_observer = Rc::clone(&observer);
                scheduler::schedule(move || {
                    task_state.scheduled.set(false);
                    if !task_state.active.get() {
                        return;
                    }
                    let latest = task_state.latest.borrow_mut().take();
                    if let Some(value) = latest {
                        task_observer(value);
                    }
                });
            });
            subscription.add_teardown(move || {
                state.active.set(false);
                state.latest.borrow_mut().take();
            });
            subscription
        })
    }
}

struct Coalesce<T> {
    latest: RefCell<Option<T>>,
    primed: Cell<bool>,
    scheduled: Cell<bool>,
    active: Cell<bool>,
}
