//! Shuffle-and-cycle peer selection.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Endless sequence of positions drawn from reshuffled permutations.
///
/// Positions `0..len` are consumed from a shuffled permutation; once it is
/// exhausted a fresh one is drawn. Within one cycle of `len` draws every
/// position appears exactly once.
#[derive(Debug, Clone)]
pub struct ShuffleCycle {
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl ShuffleCycle {
    /// Creates a selector over `len` positions.
    #[must_use]
    pub fn new(len: usize, mut rng: StdRng) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rng);
        Self {
            order,
            cursor: 0,
            rng,
        }
    }

    /// Returns the number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if there is nothing to select.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Iterator for ShuffleCycle {
    type Item = usize;

    /// Returns the next position, or `None` if there are no positions.
    fn next(&mut self) -> Option<usize> {
        if self.order.is_empty() {
            return None;
        }

        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }

        let position = self.order[self.cursor];
        self.cursor += 1;
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn empty_selector_yields_nothing() {
        let mut cycle = ShuffleCycle::new(0, StdRng::seed_from_u64(0));
        assert!(cycle.is_empty());
        assert_eq!(cycle.next(), None);
    }

    #[test]
    fn seeded_selectors_agree() {
        let a: Vec<_> = ShuffleCycle::new(10, StdRng::seed_from_u64(5)).take(30).collect();
        let b: Vec<_> = ShuffleCycle::new(10, StdRng::seed_from_u64(5)).take(30).collect();
        assert_eq!(a, b);
    }

    proptest! {
        /// Property: every cycle is a permutation of all positions
        #[test]
        fn prop_each_cycle_is_a_permutation(len in 1usize..40, seed in any::<u64>(), cycles in 1usize..5) {
            let mut cycle = ShuffleCycle::new(len, StdRng::seed_from_u64(seed));
            for _ in 0..cycles {
                let drawn: HashSet<_> = (&mut cycle).take(len).collect();
                prop_assert_eq!(drawn.len(), len);
                prop_assert!(drawn.iter().all(|&p| p < len));
            }
        }
    }
}
