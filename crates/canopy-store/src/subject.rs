//! Hot multicast subjects
//!
//! Delivery is trampolined: a value pushed while the subject is already
//! delivering is queued and handed out only after the current value has
//! reached every observer. Observers therefore always see values in the
//! order they were committed, even when an observer writes back into the
//! subject it is listening to.

use crate::stream::{Observer, Stream};
use crate::Subscription;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

struct Entry<T> {
    id: u64,
    active: Rc<Cell<bool>>,
    observer: Observer<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Rc::clone(&self.active),
            observer: Rc::clone(&self.observer),
        }
    }
}

impl<T> Entry<T> {
    fn call(&self, value: T) {
        if self.active.get() {
            (self.observer)(value);
        }
    }
}

struct SubjectInner<T> {
    observers: RefCell<Vec<Entry<T>>>,
    pending: RefCell<VecDeque<T>>,
    next_id: Cell<u64>,
    emitting: Cell<bool>,
    closed: Cell<bool>,
}

/// Marks a subject as delivering for the guard's lifetime
struct Emitting<'a, T> {
    inner: &'a SubjectInner<T>,
}

impl<'a, T> Emitting<'a, T> {
    fn enter(inner: &'a SubjectInner<T>) -> Self {
        inner.emitting.set(true);
        Self { inner }
    }
}

impl<T> Drop for Emitting<'_, T> {
    fn drop(&mut self) {
        self.inner.emitting.set(false);
        if std::thread::panicking() {
            self.inner.pending.borrow_mut().clear();
        }
    }
}

/// A multicast subject without a current value
pub struct Subject<T> {
    inner: Rc<SubjectInner<T>>,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SubjectInner {
                observers: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
                next_id: Cell::new(0),
                emitting: Cell::new(false),
                closed: Cell::new(false),
            }),
        }
    }

    /// Push a value to every observer
    pub fn next(&self, value: T) {
        if self.inner.closed.get() {
            return;
        }
        self.inner.pending.borrow_mut().push_back(value);
        if !self.inner.emitting.get() {
            self.drain();
        }
    }

    fn drain(&self) {
        let _emitting = Emitting::enter(&self.inner);
        loop {
            let Some(value) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            let observers: Vec<Entry<T>> = self.inner.observers.borrow().clone();
            for entry in observers {
                if self.inner.closed.get() {
                    return;
                }
                entry.call(value.clone());
            }
        }
    }

    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        self.register(observer).0
    }

    fn register(&self, observer: Observer<T>) -> (Subscription, Entry<T>) {
        if self.inner.closed.get() {
            let entry = Entry {
                id: u64::MAX,
                active: Rc::new(Cell::new(false)),
                observer,
            };
            return (Subscription::empty(), entry);
        }
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let entry = Entry {
            id,
            active: Rc::new(Cell::new(true)),
            observer,
        };
        self.inner.observers.borrow_mut().push(entry.clone());

        let weak: Weak<SubjectInner<T>> = Rc::downgrade(&self.inner);
        let active = Rc::clone(&entry.active);
        let subscription = Subscription::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.observers.borrow_mut().retain(|e| e.id != id);
            }
        });
        (subscription, entry)
    }

    /// Register `observer` and hand it `value` before anything queued after it
    fn subscribe_replaying(&self, observer: Observer<T>, value: T) -> Subscription {
        let (subscription, entry) = self.register(observer);
        if self.inner.closed.get() {
            return subscription;
        }
        if self.inner.emitting.get() {
            entry.call(value);
        } else {
            {
                let _emitting = Emitting::enter(&self.inner);
                entry.call(value);
            }
            if !self.inner.pending.borrow().is_empty() {
                self.drain();
            }
        }
        subscription
    }

    /// Close the subject and release every observer
    pub fn complete(&self) {
        if self.inner.closed.replace(true) {
            return;
        }
        self.inner.pending.borrow_mut().clear();
        let observers = std::mem::take(&mut *self.inner.observers.borrow_mut());
        for entry in &observers {
            entry.active.set(false);
        }
        drop(observers);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().len()
    }

    /// A stream that subscribes to this subject
    pub fn as_stream(&self) -> Stream<T> {
        let subject = self.clone();
        Stream::new(move |observer| subject.subscribe(observer))
    }
}

/// A subject that holds a current value and replays it to new subscribers
pub struct BehaviorSubject<T> {
    value: Rc<RefCell<T>>,
    subject: Subject<T>,
}

impl<T> Clone for BehaviorSubject<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            subject: self.subject.clone(),
        }
    }
}

impl<T: Clone + 'static> BehaviorSubject<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(initial)),
            subject: Subject::new(),
        }
    }

    /// The current value
    pub fn value(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn next(&self, value: T) {
        self.commit(value, |_| {});
    }

    /// Store `value`, run `on_commit`, then deliver it
    ///
    /// A closed subject keeps its last value and ignores the commit.
    pub fn commit(&self, value: T, on_commit: impl FnOnce(&T)) {
        if self.subject.is_closed() {
            return;
        }
        *self.value.borrow_mut() = value.clone();
        on_commit(&value);
        self.subject.next(value);
    }

    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        let current = self.value();
        self.subject.subscribe_replaying(observer, current)
    }

    pub fn complete(&self) {
        self.subject.complete();
    }

    pub fn is_closed(&self) -> bool {
        self.subject.is_closed()
    }

    pub fn observer_count(&self) -> usize {
        self.subject.observer_count()
    }

    /// A stream that replays the current value, then follows every commit
    pub fn as_stream(&self) -> Stream<T> {
        let subject = self.clone();
        Stream::new(move |observer| subject.subscribe(observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, Observer<T>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, Rc::new(move |v: T| sink.borrow_mut().push(v)))
    }

    #[test]
    fn test_subject_multicasts() {
        let subject = Subject::new();
        let (a, obs_a) = recorder();
        let (b, obs_b) = recorder();
        let _sa = subject.subscribe(obs_a);
        let _sb = subject.subscribe(obs_b);

        subject.next(1);
        subject.next(2);

        assert_eq!(*a.borrow(), vec![1, 2]);
        assert_eq!(*b.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_reentrant_next_is_delivered_after_current_value() {
        let subject: Subject<i32> = Subject::new();
        let writer = subject.clone();
        let _echo = subject.subscribe(Rc::new(move |v: i32| {
            if v == 1 {
                writer.next(2);
            }
        }));
        let (seen, observer) = recorder();
        let _late = subject.subscribe(observer);

        subject.next(1);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribed_observer_is_skipped_mid_delivery() {
        let subject: Subject<i32> = Subject::new();
        let (seen, observer) = recorder();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let killer = victim.clone();
        let _first = subject.subscribe(Rc::new(move |_: i32| {
            let taken = killer.borrow_mut().take();
            drop(taken);
        }));
        *victim.borrow_mut() = Some(subject.subscribe(observer));

        subject.next(1);
        assert!(seen.borrow().is_empty());
        assert_eq!(subject.observer_count(), 1);
    }

    #[test]
    fn test_behavior_replays_current_value() {
        let subject = BehaviorSubject::new(1);
        subject.next(2);
        let (seen, observer) = recorder();
        let _sub = subject.subscribe(observer);
        subject.next(3);
        assert_eq!(*seen.borrow(), vec![2, 3]);
    }

    #[test]
    fn test_commit_hook_runs_before_delivery() {
        let subject = BehaviorSubject::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let _sub = subject.subscribe(Rc::new(move |v: i32| sink.borrow_mut().push(format!("deliver {}", v))));

        let hook = log.clone();
        subject.commit(5, |v| hook.borrow_mut().push(format!("commit {}", v)));

        assert_eq!(*log.borrow(), vec!["deliver 0", "commit 5", "deliver 5"]);
    }

    #[test]
    fn test_complete_releases_observers_and_ignores_values() {
        let subject = BehaviorSubject::new(0);
        let (seen, observer) = recorder();
        let _sub = subject.subscribe(observer);
        subject.complete();
        subject.next(1);

        assert_eq!(*seen.borrow(), vec![0]);
        assert_eq!(subject.observer_count(), 0);
        assert_eq!(subject.value(), 0);

        let (late, observer) = recorder();
        let _late = subject.subscribe(observer);
        assert!(late.borrow().is_empty());
    }
}
