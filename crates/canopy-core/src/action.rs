//! Action envelopes dispatched on the shared channel

use crate::{State, Value};
use serde::{Deserialize, Serialize};

/// Kind of the action dispatched after every committed state update
pub const SET_STATE: &str = "SET_STATE";

/// A tagged record describing something that happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Discriminant matched by `of_action`
    pub kind: String,
    /// Arbitrary payload
    pub payload: Value,
}

impl Action {
    /// Create an action with a payload
    pub fn new(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }

    /// Create an action with a null payload
    pub fn kind_only(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Null)
    }

    /// The built-in state-replaced action
    ///
    /// Stores dispatch this themselves after each commit.
    #[doc(hidden)]
    pub fn set_state(state: &State) -> Self {
        Self {
            kind: SET_STATE.to_string(),
            payload: state.to_value(),
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn is_set_state(&self) -> bool {
        self.is(SET_STATE)
    }

    /// The committed snapshot carried by a `SET_STATE` action
    pub fn set_state_payload(&self) -> Option<State> {
        if !self.is_set_state() {
            return None;
        }
        State::from_value(self.payload.clone()).ok()
    }
}

/// A user-defined action type with a fixed discriminant
///
/// ```
/// use canopy_core::{Action, ActionKind, Value};
///
/// struct AddItem(String);
///
/// impl ActionKind for AddItem {
///     const KIND: &'static str = "ADD_ITEM";
///
///     fn into_payload(self) -> Value {
///         self.0.into()
///     }
/// }
///
/// let action = Action::from(AddItem("milk".into()));
/// assert!(action.is(AddItem::KIND));
/// ```
pub trait ActionKind {
    const KIND: &'static str;

    fn into_payload(self) -> Value;
}

impl<A: ActionKind> From<A> for Action {
    fn from(action: A) -> Self {
        Action::new(A::KIND, action.into_payload())
    }
}
