//! Transaction values.

use serde::{Deserialize, Serialize};

/// A candidate value for one decision slot.
///
/// Equality, ordering and hashing are by value. Transactions are the unit
/// exchanged over the wire and tallied in votes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Transaction {
    value: i64,
}

impl Transaction {
    /// The zero transaction.
    pub const ZERO: Self = Self { value: 0 };

    /// Creates a transaction carrying `value`.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self { value }
    }

    /// Returns the carried value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }
}

impl From<i64> for Transaction {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<Transaction> for i64 {
    fn from(tx: Transaction) -> Self {
        tx.value
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}
