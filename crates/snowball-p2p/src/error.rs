//! P2P error types.

use crate::PeerId;
use thiserror::Error;

/// Errors that can occur during P2P operations.
#[derive(Debug, Error)]
pub enum P2pError {
    /// The peer could not be reached at all.
    #[error("cannot dial peer {peer}: {source}")]
    Dial {
        /// The peer that was dialed.
        peer: PeerId,
        /// The underlying connect error.
        #[source]
        source: std::io::Error,
    },

    /// An exchange did not complete in time.
    #[error("peer {0} timed out")]
    Timeout(PeerId),

    /// The peer is not part of this transport's peer set.
    #[error("unknown peer: {0}")]
    UnknownPeer(PeerId),

    /// The transport has no peers to sample.
    #[error("no peers to sample")]
    NoPeers,

    /// Too many attempts failed before enough answers were collected.
    #[error("retry budget exhausted after {collected} of {wanted} answers: {last}")]
    RetriesExhausted {
        /// Answers collected before giving up.
        collected: usize,
        /// Answers requested.
        wanted: usize,
        /// The failure that exhausted the budget.
        last: Box<P2pError>,
    },

    /// The local query handler could not answer.
    #[error("handler error: {0}")]
    Handler(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] snowball_protocol::ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl P2pError {
    /// Returns true if the peer could not be reached, as opposed to a peer
    /// that was reached but failed mid-exchange.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Dial { .. } | Self::UnknownPeer(_))
    }
}

/// A specialized Result type for P2P operations.
pub type Result<T> = std::result::Result<T, P2pError>;
