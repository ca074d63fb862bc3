//! Store error types.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// Apart from [`StoreError::NotDone`] and [`StoreError::Io`], every variant
/// signals a broken ordering guarantee in the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The index is outside the decision array.
    #[error("invalid index {ix}: store holds {len} indices")]
    IndexOutOfRange {
        /// The requested index.
        ix: u64,
        /// Number of indices in the store.
        len: usize,
    },

    /// The index has already been decided and is frozen.
    #[error("the transaction {0} is decided")]
    AlreadyDecided(u64),

    /// An earlier index is still undecided.
    #[error("cannot decide index {ix} before index {next}")]
    OutOfOrder {
        /// The index the caller tried to decide.
        ix: u64,
        /// The next index that may be decided.
        next: u64,
    },

    /// No candidate with positive confidence exists for the index.
    #[error("no candidate in conflict set {0}")]
    EmptyConflictSet(u64),

    /// Commit was attempted before every index was decided.
    #[error("not all transactions decided: {decided} of {total}")]
    NotDone {
        /// Indices decided so far.
        decided: usize,
        /// Indices in the store.
        total: usize,
    },

    /// An I/O error occurred while persisting the result.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
