//! Subscription handles
//!
//! Every `subscribe` returns a [`Subscription`]. Dropping it, or calling
//! [`Subscription::unsubscribe`], runs its teardown exactly once. Hold on to
//! the handle for as long as the listener should stay attached.

use std::cell::RefCell;
use std::fmt;

/// Disposer for an active subscription
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardowns: Vec<Box<dyn FnOnce()>>,
    closed: bool,
}

impl Subscription {
    /// A subscription with nothing to tear down
    pub fn empty() -> Self {
        Self {
            teardowns: Vec::new(),
            closed: false,
        }
    }

    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardowns: vec![Box::new(teardown)],
            closed: false,
        }
    }

    /// Attach another subscription; both are torn down together
    pub fn add(&mut self, other: Subscription) {
        if self.closed {
            drop(other);
            return;
        }
        self.teardowns.push(Box::new(move || drop(other)));
    }

    /// Attach a teardown closure
    pub fn add_teardown(&mut self, teardown: impl FnOnce() + 'static) {
        if self.closed {
            teardown();
            return;
        }
        self.teardowns.push(Box::new(teardown));
    }

    pub fn unsubscribe(mut self) {
        self.close();
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for teardown in std::mem::take(&mut self.teardowns) {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("teardowns", &self.teardowns.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Subscriptions owned by a store and released together
#[derive(Default)]
pub struct SubscriptionSet {
    entries: RefCell<Vec<Subscription>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, subscription: Subscription) {
        self.entries.borrow_mut().push(subscription);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Unsubscribe everything held so far
    pub fn clear(&self) {
        // Teardowns may touch this set again, so release the borrow first.
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }
}

impl fmt::Debug for SubscriptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_drop_runs_teardown_once() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let sub = Subscription::new(move || c.set(c.get() + 1));
        drop(sub);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_composite_tears_down_children() {
        let count = Rc::new(Cell::new(0));
        let mut parent = Subscription::empty();
        for _ in 0..3 {
            let c = count.clone();
            parent.add(Subscription::new(move || c.set(c.get() + 1)));
        }
        parent.unsubscribe();
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_set_clear_releases_all() {
        let count = Rc::new(Cell::new(0));
        let set = SubscriptionSet::new();
        for _ in 0..2 {
            let c = count.clone();
            set.push(Subscription::new(move || c.set(c.get() + 1)));
        }
        assert_eq!(set.len(), 2);
        set.clear();
        assert_eq!(count.get(), 2);
        assert!(set.is_empty());
    }
}
