//! Common types used throughout `snowball`.
//!
//! This crate provides the value types exchanged between peers and
//! tallied by the consensus engine.

mod transaction;

pub use transaction::Transaction;

/// Index of a decision slot.
///
/// Every node decides one [`Transaction`] per index, in increasing index order.
pub type Index = u64;
