//! Conflict-set storage for Snowball.
//!
//! This crate keeps, for every decision index, the set of candidate
//! transactions a node has seen win sampling rounds, together with their
//! cumulative confidence and consecutive-success streak, and the
//! append-only sequence of decided transactions.

mod candidate;
mod error;
mod output;
mod store;

pub use candidate::Candidate;
pub use error::StoreError;
pub use output::{output_path, run_name, RUN_NAME_LEN};
pub use store::ConflictSetStore;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
