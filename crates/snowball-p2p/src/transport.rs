//! The sampling interface.

use crate::{P2pError, PeerId, Result, RETRY_BUDGET};
use async_trait::async_trait;
use snowball_protocol::{Request, Response};
use snowball_types::{Index, Transaction};
use tracing::{debug, warn};

/// Answers queries from other peers.
///
/// Implemented by the consensus layer and installed into a [`Server`] or a
/// [`MemoryNetwork`].
///
/// [`Server`]: crate::Server
/// [`MemoryNetwork`]: crate::MemoryNetwork
pub trait QueryHandler: Send + Sync + 'static {
    /// Returns the local preference (or decision) at `ix`.
    fn answer(&self, ix: Index) -> Result<Transaction>;

    /// Returns true once every index is decided locally.
    fn is_done(&self) -> bool;

    /// Maps a wire request to its response.
    fn respond(&self, request: Request) -> Result<Response> {
        match request {
            Request::Probe => Ok(Response::done(self.is_done())),
            Request::Query(ix) => self.answer(ix).map(|tx| Response(tx.value())),
        }
    }
}

/// Samples peers for their preferences.
///
/// The consensus engine depends only on this trait, never on which
/// implementation is active.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Returns every known peer, in positional order.
    fn peers(&self) -> Vec<PeerId>;

    /// Draws the next peer to sample, or `None` if there are no peers.
    fn next_peer(&self) -> Option<PeerId>;

    /// Asks one peer for its preference at `ix`.
    async fn ask_one(&self, peer: PeerId, ix: Index) -> Result<Transaction>;

    /// Asks one peer whether it has decided every index.
    async fn probe_done(&self, peer: PeerId) -> Result<bool>;

    /// Collects exactly `k` preferences at `ix`.
    ///
    /// Up to [`RETRY_BUDGET`] failed attempts are tolerated over the whole
    /// call; successful answers never consume the budget.
    async fn ask(&self, k: usize, ix: Index) -> Result<Vec<Transaction>> {
        let mut budget = RETRY_BUDGET;
        let mut answers = Vec::with_capacity(k);

        while answers.len() < k {
            let peer = self.next_peer().ok_or(P2pError::NoPeers)?;
            match self.ask_one(peer, ix).await {
                Ok(tx) => {
                    debug!(peer = %peer, ix, value = tx.value(), "Peer answered");
                    answers.push(tx);
                }
                Err(e) => {
                    if budget == 0 {
                        return Err(P2pError::RetriesExhausted {
                            collected: answers.len(),
                            wanted: k,
                            last: Box::new(e),
                        });
                    }
                    budget -= 1;
                    warn!(peer = %peer, ix, error = %e, remaining = budget, "Can not ask peer");
                }
            }
        }

        Ok(answers)
    }
}
