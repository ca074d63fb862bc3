//! Candidates and per-index conflict sets.

use snowball_types::Transaction;

/// A transaction under consideration for one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// The candidate value.
    pub transaction: Transaction,
    /// Number of rounds this candidate has won. Never decreases.
    pub confidence: u64,
    /// Number of immediately consecutive rounds this candidate has won.
    pub consecutive_success: u64,
}

impl Candidate {
    /// The initial preference of a node, before any round was played.
    #[must_use]
    pub const fn seed(transaction: Transaction) -> Self {
        Self {
            transaction,
            confidence: 1,
            consecutive_success: 0,
        }
    }

    /// A candidate first learned by winning a round.
    #[must_use]
    pub const fn first_win(transaction: Transaction) -> Self {
        Self {
            transaction,
            confidence: 1,
            consecutive_success: 1,
        }
    }
}

/// Candidates of one index, in insertion order, unique by value.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConflictSet {
    candidates: Vec<Candidate>,
}

impl ConflictSet {
    pub(crate) fn seeded(seed: Transaction) -> Self {
        Self {
            candidates: vec![Candidate::seed(seed)],
        }
    }

    pub(crate) fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Highest confidence; ties go to the earliest inserted candidate.
    pub(crate) fn preferred(&self) -> Option<Transaction> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates {
            if candidate.confidence > best.map_or(0, |b| b.confidence) {
                best = Some(candidate);
            }
        }
        best.map(|c| c.transaction)
    }

    /// Longest streak; ties go to the earliest inserted candidate.
    pub(crate) fn highest_success(&self) -> (Transaction, u64) {
        let mut best = (Transaction::ZERO, 0);
        for candidate in &self.candidates {
            if candidate.consecutive_success > best.1 {
                best = (candidate.transaction, candidate.consecutive_success);
            }
        }
        best
    }

    pub(crate) fn record_win(&mut self, winner: Transaction) {
        let mut found = false;
        for candidate in &mut self.candidates {
            if candidate.transaction == winner {
                candidate.confidence += 1;
                candidate.consecutive_success += 1;
                found = true;
            } else {
                candidate.consecutive_success = 0;
            }
        }

        if !found {
            self.candidates.push(Candidate::first_win(winner));
        }
    }

    pub(crate) fn reset_streaks(&mut self) {
        for candidate in &mut self.candidates {
            candidate.consecutive_success = 0;
        }
    }
}
