//! Identity comparison
//!
//! Change detection throughout canopy asks "is this the same value I saw
//! last time", not "is this an equal value". Scalars are their own
//! identity; shared compound values are the same only when they point at
//! the same allocation.

use crate::{State, Value};
use std::rc::Rc;
use std::sync::Arc;

/// Identity equality used for change suppression
pub trait Same {
    /// Returns true when `other` is the same value as `self`
    fn same(&self, other: &Self) -> bool;
}

impl Same for Value {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits() || a == b,
            (Value::List(_), _) | (Value::Map(_), _) => false,
            (a, b) => a == b,
        }
    }
}

impl Same for State {
    fn same(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: ?Sized> Same for Arc<T> {
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Same for Rc<T> {
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: Same> Same for Option<T> {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Same> Same for Vec<T> {
    fn same(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same(b))
    }
}

macro_rules! same_by_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Same for $ty {
                fn same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

same_by_eq!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

macro_rules! same_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Same),+> Same for ($($name,)+) {
            fn same(&self, other: &Self) -> bool {
                $(self.$idx.same(&other.$idx))&&+
            }
        }
    };
}

same_for_tuple!(A: 0);
same_for_tuple!(A: 0, B: 1);
same_for_tuple!(A: 0, B: 1, C: 2);
same_for_tuple!(A: 0, B: 1, C: 2, D: 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_compare_by_value() {
        assert!(Value::Int(3).same(&Value::Int(3)));
        assert!(Value::from("a").same(&Value::from("a")));
        assert!(!Value::Int(3).same(&Value::Float(3.0)));
    }

    #[test]
    fn test_compound_values_compare_by_pointer() {
        let list = Value::list(vec![1i64]);
        let shared = list.clone();
        let equal_copy = Value::list(vec![1i64]);

        assert!(list.same(&shared));
        assert_eq!(list, equal_copy);
        assert!(!list.same(&equal_copy));
    }

    #[test]
    fn test_tuples_and_options() {
        let list = Value::list(vec![1i64]);
        assert!((1i64, list.clone()).same(&(1i64, list.clone())));
        assert!(Some(list.clone()).same(&Some(list)));
        assert!(!None::<Value>.same(&Some(Value::Null)));
    }
}
