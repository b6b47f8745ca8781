//! Tree-wide action channel

use crate::subject::Subject;
use crate::Stream;
use canopy_core::{Action, ActionKind};
use std::fmt;

/// Shared, multi-writer, unbounded channel of actions
///
/// Every store in a tree holds a clone of the same channel. Any store may
/// dispatch; nobody owns the channel exclusively and dispatches are never
/// rejected.
#[derive(Clone, Default)]
pub struct ActionChannel {
    subject: Subject<Action>,
}

impl ActionChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        log::trace!("dispatch {}", action.kind);
        self.subject.next(action);
    }

    /// Every action dispatched after subscribing
    pub fn stream(&self) -> Stream<Action> {
        self.subject.as_stream()
    }

    /// Actions whose kind equals `kind`
    pub fn of_kind(&self, kind: impl Into<String>) -> Stream<Action> {
        let kind = kind.into();
        self.stream().filter(move |action| action.is(&kind))
    }

    /// Actions of a user-defined action type
    pub fn of_type<A: ActionKind>(&self) -> Stream<Action> {
        self.of_kind(A::KIND)
    }

    pub fn listener_count(&self) -> usize {
        self.subject.observer_count()
    }
}

impl fmt::Debug for ActionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionChannel")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_core::Value;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ping(i64);

    impl ActionKind for Ping {
        const KIND: &'static str = "PING";

        fn into_payload(self) -> Value {
            self.0.into()
        }
    }

    #[test]
    fn test_clones_share_listeners() {
        let channel = ActionChannel::new();
        let writer = channel.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = channel.stream().subscribe(move |a| sink.borrow_mut().push(a.kind));

        writer.dispatch(Action::kind_only("A"));
        channel.dispatch(Action::kind_only("B"));

        assert_eq!(*seen.borrow(), vec!["A", "B"]);
    }

    #[test]
    fn test_of_type_filters_by_kind() {
        let channel = ActionChannel::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = channel
            .of_type::<Ping>()
            .subscribe(move |a| sink.borrow_mut().push(a.payload));

        channel.dispatch(Ping(1));
        channel.dispatch(Action::kind_only("OTHER"));
        channel.dispatch(Ping(2));

        assert_eq!(*seen.borrow(), vec![Value::Int(1), Value::Int(2)]);
    }
}
