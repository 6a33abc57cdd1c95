//! Output facts of a join.
//!
//! A join node builds one output tuple per matching left/right pair and
//! re-maps one side of it in place when that side's facts change.

/// Facts built from a left and a right input.
///
/// Pairs work for any inputs. Joining a pair or a triple with one more fact
/// produces a flat triple or quad, so long join chains keep flat facts.
pub trait Joined<L, R> {
    fn join(left: &L, right: &R) -> Self;

    fn set_left(&mut self, left: &L);

    fn set_right(&mut self, right: &R);
}

impl<L: Clone, R: Clone> Joined<L, R> for (L, R) {
    fn join(left: &L, right: &R) -> Self {
        (left.clone(), right.clone())
    }

    fn set_left(&mut self, left: &L) {
        self.0 = left.clone();
    }

    fn set_right(&mut self, right: &R) {
        self.1 = right.clone();
    }
}

impl<A: Clone, B: Clone, C: Clone> Joined<(A, B), C> for (A, B, C) {
    fn join(left: &(A, B), right: &C) -> Self {
        (left.0.clone(), left.1.clone(), right.clone())
    }

    fn set_left(&mut self, left: &(A, B)) {
        self.0 = left.0.clone();
        self.1 = left.1.clone();
    }

    fn set_right(&mut self, right: &C) {
        self.2 = right.clone();
    }
}

impl<A: Clone, B: Clone, C: Clone, D: Clone> Joined<(A, B, C), D> for (A, B, C, D) {
    fn join(left: &(A, B, C), right: &D) -> Self {
        (left.0.clone(), left.1.clone(), left.2.clone(), right.clone())
    }

    fn set_left(&mut self, left: &(A, B, C)) {
        self.0 = left.0.clone();
        self.1 = left.1.clone();
        self.2 = left.2.clone();
    }

    fn set_right(&mut self, right: &D) {
        self.3 = right.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair() {
        let mut pair = <(i32, char)>::join(&1, &'a');
        pair.set_right(&'b');
        assert_eq!(pair, (1, 'b'));
    }

    #[test]
    fn test_flat_quad() {
        let triple = <(i32, i32, i32)>::join(&(1, 2), &3);
        let mut quad = <(i32, i32, i32, i32)>::join(&triple, &4);
        quad.set_left(&(7, 8, 9));
        assert_eq!(quad, (7, 8, 9, 4));
    }
}
