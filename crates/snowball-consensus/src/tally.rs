//! Vote counting.

use snowball_types::Transaction;

/// Vote counts in first-encountered order.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    counts: Vec<(Transaction, usize)>,
}

impl Tally {
    fn add(&mut self, tx: Transaction) {
        match self.counts.iter_mut().find(|(seen, _)| *seen == tx) {
            Some((_, count)) => *count += 1,
            None => self.counts.push((tx, 1)),
        }
    }

    /// Returns the most voted value, the earliest sampled one on ties.
    pub(crate) fn winner(&self) -> Option<(Transaction, usize)> {
        let mut best: Option<(Transaction, usize)> = None;
        for &(tx, count) in &self.counts {
            if best.map_or(true, |(_, votes)| count > votes) {
                best = Some((tx, count));
            }
        }
        best
    }
}

impl FromIterator<Transaction> for Tally {
    fn from_iter<I: IntoIterator<Item = Transaction>>(iter: I) -> Self {
        let mut tally = Self::default();
        for tx in iter {
            tally.add(tx);
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tally(values: &[i64]) -> Tally {
        values.iter().copied().map(Transaction::new).collect()
    }

    #[test]
    fn empty_sample_has_no_winner() {
        assert_eq!(tally(&[]).winner(), None);
    }

    #[test]
    fn majority_wins() {
        assert_eq!(tally(&[4, 7, 7, 4, 7]).winner(), Some((Transaction::new(7), 3)));
    }

    #[test]
    fn ties_go_to_first_sampled() {
        assert_eq!(tally(&[9, 2, 2, 9]).winner(), Some((Transaction::new(9), 2)));
        assert_eq!(tally(&[2, 9, 9, 2]).winner(), Some((Transaction::new(2), 2)));
    }

    proptest! {
        /// The winner holds the largest count, and no earlier-sampled value
        /// holds as many votes.
        #[test]
        fn winner_is_first_with_max_count(values in prop::collection::vec(0i64..4, 1..20)) {
            let (winner, votes) = tally(&values).winner().unwrap();
            let count = |v: i64| values.iter().filter(|x| **x == v).count();

            prop_assert_eq!(votes, count(winner.value()));
            prop_assert!(values.iter().all(|v| count(*v) <= votes));

            let first = values.iter().position(|v| *v == winner.value()).unwrap();
            prop_assert!(values[..first].iter().all(|v| count(*v) < votes));
        }
    }
}
