//! Consensus error types.

use snowball_p2p::P2pError;
use snowball_store::StoreError;
use thiserror::Error;

/// Errors that can occur during consensus operations.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The thresholds are inconsistent.
    #[error("invalid consensus parameters: {0}")]
    InvalidParams(String),

    /// The decision loop was cancelled.
    #[error("consensus cancelled")]
    Cancelled,

    /// A store invariant was violated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Sampling failed.
    #[error("transport error: {0}")]
    Transport(#[from] P2pError),
}

impl ConsensusError {
    /// Returns true if the failed round can simply be retried.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A specialized Result type for consensus operations.
pub type Result<T> = std::result::Result<T, ConsensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_recoverable() {
        assert!(ConsensusError::from(P2pError::NoPeers).is_recoverable());
        assert!(!ConsensusError::from(StoreError::AlreadyDecided(0)).is_recoverable());
        assert!(!ConsensusError::InvalidParams("k".into()).is_recoverable());
        assert!(!ConsensusError::Cancelled.is_recoverable());
    }
}
