//! Sequence-pair encoding of a packed placement: two permutations over the
//! block indices whose relative orders decide, for every pair of blocks,
//! whether the constraint between them is horizontal or vertical.

use derive_more::Deref;
use rand::{Rng, seq::SliceRandom};

/// A permutation of `0..n` with its inverse kept alongside, so position
/// lookups and move undos are O(1) instead of a linear scan.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deref)]
pub struct Permutation {
    #[deref]
    order: Vec<usize>,
    pos: Vec<usize>,
}

impl Permutation {
    pub fn identity(n: usize) -> Self {
        Permutation { order: (0..n).collect(), pos: (0..n).collect() }
    }

    /// Builds from an explicit order. Panics when `order` is not a
    /// permutation of `0..order.len()`.
    pub fn from_order(order: Vec<usize>) -> Self {
        let mut pos = vec![usize::MAX; order.len()];
        for (i, &v) in order.iter().enumerate() {
            assert!(
                v < order.len() && pos[v] == usize::MAX,
                "not a permutation of 0..{}: {order:?}",
                order.len()
            );
            pos[v] = i;
        }
        Permutation { order, pos }
    }

    /// Position of value `v` in the permutation.
    pub fn position_of(&self, v: usize) -> usize {
        self.pos[v]
    }

    /// Swaps the values at positions `i` and `j`.
    pub fn swap_positions(&mut self, i: usize, j: usize) {
        self.order.swap(i, j);
        self.pos[self.order[i]] = i;
        self.pos[self.order[j]] = j;
    }

    /// Swaps the positions of values `a` and `b`.
    pub fn swap_values(&mut self, a: usize, b: usize) {
        let (i, j) = (self.pos[a], self.pos[b]);
        self.swap_positions(i, j);
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
        for (i, &v) in self.order.iter().enumerate() {
            self.pos[v] = i;
        }
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.order.len() == self.pos.len()
            && self.order.iter().enumerate().all(|(i, &v)| self.pos[v] == i)
    }
}

/// The pair (P, N). `positive` is the P sequence, `negative` the N
/// sequence; both always stay permutations of the same index set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeqPair {
    positive: Permutation,
    negative: Permutation,
}

impl SeqPair {
    pub fn identity(n: usize) -> Self {
        SeqPair { positive: Permutation::identity(n), negative: Permutation::identity(n) }
    }

    /// Builds from explicit P and N orders (mainly for tests and replay).
    pub fn from_orders(positive: Vec<usize>, negative: Vec<usize>) -> Self {
        assert_eq!(positive.len(), negative.len(), "P and N must cover the same blocks");
        SeqPair {
            positive: Permutation::from_order(positive),
            negative: Permutation::from_order(negative),
        }
    }

    pub fn len(&self) -> usize {
        self.positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty()
    }

    pub const fn positive(&self) -> &Permutation {
        &self.positive
    }

    pub const fn negative(&self) -> &Permutation {
        &self.negative
    }

    /// Swaps two positions in P only.
    pub fn swap_positive(&mut self, i: usize, j: usize) {
        self.positive.swap_positions(i, j);
    }

    /// Swaps blocks `a` and `b` in both sequences.
    pub fn swap_both(&mut self, a: usize, b: usize) {
        self.positive.swap_values(a, b);
        self.negative.swap_values(a, b);
    }

    /// Re-rolls both sequences independently.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.positive.shuffle(rng);
        self.negative.shuffle(rng);
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::SmallRng};
    use test_case::test_case;

    use super::*;

    fn is_permutation(p: &Permutation) -> bool {
        let mut seen = vec![false; p.len()];
        for &v in p.iter() {
            if seen[v] {
                return false;
            }
            seen[v] = true;
        }
        seen.into_iter().all(|s| s) && p.is_consistent()
    }

    #[test]
    fn identity_positions() {
        let sp = SeqPair::identity(5);
        assert_eq!(&**sp.positive(), &[0, 1, 2, 3, 4]);
        assert_eq!(sp.negative().position_of(3), 3);
    }

    #[test_case(0, 1)]
    #[test_case(2, 7)]
    #[test_case(7, 2)]
    fn swap_positive_twice_is_identity(i: usize, j: usize) {
        let mut sp = SeqPair::identity(8);
        let before = sp.clone();
        sp.swap_positive(i, j);
        assert!(is_permutation(sp.positive()));
        sp.swap_positive(i, j);
        assert_eq!(sp, before);
    }

    #[test_case(0, 4)]
    #[test_case(4, 0)]
    #[test_case(3, 5)]
    fn swap_both_twice_is_identity(a: usize, b: usize) {
        let mut sp = SeqPair::identity(6);
        let mut rng = SmallRng::seed_from_u64(11);
        sp.shuffle(&mut rng);
        let before = sp.clone();
        sp.swap_both(a, b);
        assert!(is_permutation(sp.positive()));
        assert!(is_permutation(sp.negative()));
        sp.swap_both(a, b);
        assert_eq!(sp, before);
    }

    #[test]
    fn swap_both_moves_the_values() {
        let mut sp = SeqPair::identity(4);
        sp.swap_both(1, 3);
        assert_eq!(&**sp.positive(), &[0, 3, 2, 1]);
        assert_eq!(&**sp.negative(), &[0, 3, 2, 1]);
        assert_eq!(sp.positive().position_of(3), 1);
    }

    #[test]
    fn shuffles_stay_permutations() {
        let mut sp = SeqPair::identity(16);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..100 {
            sp.shuffle(&mut rng);
            assert!(is_permutation(sp.positive()));
            assert!(is_permutation(sp.negative()));
        }
    }
}
