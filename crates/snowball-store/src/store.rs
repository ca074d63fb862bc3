//! The conflict-set store.

use crate::candidate::{Candidate, ConflictSet};
use crate::{Result, StoreError};
use parking_lot::RwLock;
use rand::Rng;
use snowball_types::{Index, Transaction};
use std::path::{Path, PathBuf};

/// Per-index candidate sets plus the append-only decided sequence.
///
/// The store is shared between the decision loop, which is its only writer,
/// and the connection handlers answering peer queries. All state sits behind
/// one reader/writer lock so readers never observe a half-applied update.
#[derive(Debug)]
pub struct ConflictSetStore {
    inner: RwLock<Inner>,
    output: PathBuf,
}

#[derive(Debug)]
struct Inner {
    conflict_sets: Vec<ConflictSet>,
    decided: Vec<Transaction>,
}

impl Inner {
    fn slot(&self, ix: Index) -> Result<usize> {
        usize::try_from(ix)
            .ok()
            .filter(|&i| i < self.conflict_sets.len())
            .ok_or(StoreError::IndexOutOfRange {
                ix,
                len: self.conflict_sets.len(),
            })
    }

    fn is_decided(&self, slot: usize) -> bool {
        slot < self.decided.len()
    }

    /// Resolves `ix` to a slot that may still be mutated.
    fn active_slot(&self, ix: Index) -> Result<usize> {
        let slot = self.slot(ix)?;
        if self.is_decided(slot) {
            return Err(StoreError::AlreadyDecided(ix));
        }
        Ok(slot)
    }
}

impl ConflictSetStore {
    /// Creates a store of `n` indices whose seed preferences are drawn from `rng`.
    ///
    /// The seed for index `i` lies in `[i - 4, 2i - 1]`, so early indices have
    /// few possible values and independent nodes collide quickly.
    pub fn new<R: Rng + ?Sized>(n: usize, output: impl Into<PathBuf>, rng: &mut R) -> Self {
        let seeds = (0..n)
            .map(|i| {
                let i = i as i64;
                Transaction::new(rng.gen_range(0..i + 4) + (i - 4))
            })
            .collect();
        Self::with_seeds(seeds, output)
    }

    /// Creates a store with one explicit seed preference per index.
    pub fn with_seeds(seeds: Vec<Transaction>, output: impl Into<PathBuf>) -> Self {
        let conflict_sets: Vec<_> = seeds.into_iter().map(ConflictSet::seeded).collect();
        tracing::debug!(
            seeds = ?conflict_sets
                .iter()
                .filter_map(ConflictSet::preferred)
                .map(|tx| tx.value())
                .collect::<Vec<_>>(),
            "Conflict sets seeded"
        );

        Self {
            inner: RwLock::new(Inner {
                conflict_sets,
                decided: Vec::new(),
            }),
            output: output.into(),
        }
    }

    /// Returns the number of indices.
    pub fn len(&self) -> usize {
        self.inner.read().conflict_sets.len()
    }

    /// Returns true if the store holds no indices.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns where [`commit`](Self::commit) writes the result.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Returns the decided value of `ix`, or its highest-confidence candidate.
    pub fn get(&self, ix: Index) -> Result<Transaction> {
        let inner = self.inner.read();
        let slot = inner.slot(ix)?;
        if inner.is_decided(slot) {
            return Ok(inner.decided[slot]);
        }

        inner.conflict_sets[slot]
            .preferred()
            .ok_or(StoreError::EmptyConflictSet(ix))
    }

    /// Returns the candidate of `ix` with the longest streak, and that streak.
    ///
    /// Returns the zero transaction with a streak of 0 if no candidate
    /// currently has a streak.
    pub fn highest_success(&self, ix: Index) -> Result<(Transaction, u64)> {
        let inner = self.inner.read();
        let slot = inner.active_slot(ix)?;
        Ok(inner.conflict_sets[slot].highest_success())
    }

    /// Records that `tx` won a round at `ix`.
    pub fn update(&self, ix: Index, tx: Transaction) -> Result<()> {
        let mut inner = self.inner.write();
        let slot = inner.active_slot(ix)?;
        inner.conflict_sets[slot].record_win(tx);
        Ok(())
    }

    /// Records that a round at `ix` reached no quorum.
    pub fn update_failed(&self, ix: Index) -> Result<()> {
        let mut inner = self.inner.write();
        let slot = inner.active_slot(ix)?;
        inner.conflict_sets[slot].reset_streaks();
        Ok(())
    }

    /// Finalizes `tx` at `ix`. Indices must be decided strictly in order.
    pub fn decide(&self, ix: Index, tx: Transaction) -> Result<()> {
        let mut inner = self.inner.write();
        let slot = inner.active_slot(ix)?;
        if slot > inner.decided.len() {
            return Err(StoreError::OutOfOrder {
                ix,
                next: inner.decided.len() as u64,
            });
        }

        inner.decided.push(tx);
        tracing::debug!(ix, value = tx.value(), "Transaction decided");
        Ok(())
    }

    /// Returns true once every index is decided.
    pub fn done(&self) -> bool {
        let inner = self.inner.read();
        inner.decided.len() == inner.conflict_sets.len()
    }

    /// Returns the number of decided indices.
    pub fn decided_count(&self) -> usize {
        self.inner.read().decided.len()
    }

    /// Returns a copy of the decided sequence.
    pub fn decided(&self) -> Vec<Transaction> {
        self.inner.read().decided.clone()
    }

    /// Returns a snapshot of the candidates of `ix`.
    pub fn candidates(&self, ix: Index) -> Result<Vec<Candidate>> {
        let inner = self.inner.read();
        let slot = inner.slot(ix)?;
        Ok(inner.conflict_sets[slot].candidates().to_vec())
    }

    /// Writes the decided sequence to the output path.
    ///
    /// Values are written space-separated in index order. Fails without
    /// touching the filesystem unless every index is decided.
    pub fn commit(&self) -> Result<PathBuf> {
        let contents = {
            let inner = self.inner.read();
            if inner.decided.len() < inner.conflict_sets.len() {
                return Err(StoreError::NotDone {
                    decided: inner.decided.len(),
                    total: inner.conflict_sets.len(),
                });
            }

            let values: Vec<String> = inner.decided.iter().map(ToString::to_string).collect();
            format!("{}\n", values.join(" "))
        };

        if let Some(parent) = self.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.output, contents)?;

        tracing::info!(path = %self.output.display(), "Decisions committed");
        Ok(self.output.clone())
    }
}
