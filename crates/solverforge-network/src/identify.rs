//! Identity of flattened items.
//!
//! Flatten nodes reconcile an old item list against a new one by identity,
//! so that items need not implement equality. Shared pointers are compared
//! by address; plain integers and other small `Copy` keys by value.

use std::rc::Rc;
use std::sync::Arc;

/// A value whose identity survives being recomputed.
pub trait Identify {
    fn same(&self, other: &Self) -> bool;
}

impl<T: ?Sized> Identify for Rc<T> {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Identify for Arc<T> {
    #[inline]
    fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

macro_rules! identify_by_value {
    ($($t:ty),*) => {
        $(
            impl Identify for $t {
                #[inline]
                fn same(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

identify_by_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, bool);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rc_identity_ignores_equality() {
        let a = Rc::new(String::from("x"));
        let b = Rc::new(String::from("x"));

        assert!(a.same(&Rc::clone(&a)));
        assert!(!a.same(&b));
    }

    #[test]
    fn test_integers_by_value() {
        assert!(3usize.same(&3));
        assert!(!3i64.same(&4));
    }
}
