//! Consensus engine implementation.

use crate::error::{ConsensusError, Result};
use crate::responder::StoreResponder;
use crate::tally::Tally;
use snowball_p2p::PeerTransport;
use snowball_store::ConflictSetStore;
use snowball_types::{Index, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

/// Configuration for the consensus engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Peers sampled per round.
    pub k: usize,

    /// Votes a value needs within one sample to win the round.
    pub alpha: usize,

    /// Consecutive round wins needed to decide.
    pub beta: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            k: 4,
            alpha: 3,
            beta: 5,
        }
    }
}

impl EngineConfig {
    /// Checks that the thresholds are consistent.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(ConsensusError::InvalidParams("k must be at least 1".into()));
        }
        if self.alpha == 0 {
            return Err(ConsensusError::InvalidParams(
                "alpha must be at least 1".into(),
            ));
        }
        if self.beta == 0 {
            return Err(ConsensusError::InvalidParams("beta must be at least 1".into()));
        }
        if self.alpha > self.k {
            return Err(ConsensusError::InvalidParams(format!(
                "alpha ({}) must not exceed k ({})",
                self.alpha, self.k
            )));
        }
        Ok(())
    }
}

/// Result of one sampling round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// A value reached the quorum.
    Success {
        /// The value that won the round.
        winner: Transaction,
        /// Votes it received.
        votes: usize,
    },
    /// No value reached the quorum.
    Failure {
        /// Votes of the most voted value.
        best_votes: usize,
    },
}

impl RoundOutcome {
    /// Returns true if a value reached the quorum.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The consensus engine.
pub struct ConsensusEngine {
    /// Engine configuration.
    config: EngineConfig,

    /// Conflict sets and decisions.
    store: Arc<ConflictSetStore>,

    /// Peer sampling.
    transport: Arc<dyn PeerTransport>,
}

impl std::fmt::Debug for ConsensusEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsensusEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ConsensusEngine {
    /// Creates a new consensus engine.
    pub fn new(
        config: EngineConfig,
        store: Arc<ConflictSetStore>,
        transport: Arc<dyn PeerTransport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            transport,
        })
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<ConflictSetStore> {
        &self.store
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<dyn PeerTransport> {
        &self.transport
    }

    /// Returns a query handler answering from this engine's store.
    pub fn responder(&self) -> StoreResponder {
        StoreResponder::new(Arc::clone(&self.store))
    }

    /// Runs one sampling round at `ix` and records its outcome.
    pub async fn round(&self, ix: Index) -> Result<RoundOutcome> {
        let sample = self.transport.ask(self.config.k, ix).await?;
        let tally: Tally = sample.into_iter().collect();

        let outcome = match tally.winner() {
            Some((winner, votes)) if votes >= self.config.alpha => {
                self.store.update(ix, winner)?;
                RoundOutcome::Success { winner, votes }
            }
            best => {
                self.store.update_failed(ix)?;
                RoundOutcome::Failure {
                    best_votes: best.map_or(0, |(_, votes)| votes),
                }
            }
        };

        Ok(outcome)
    }

    /// Samples repeatedly until `ix` is decided, and returns the decision.
    ///
    /// Sampling or store failures abort the call; the rounds already played
    /// stay recorded in the store.
    pub async fn decide(&self, ix: Index) -> Result<Transaction> {
        let mut rounds = 0u64;
        loop {
            rounds += 1;
            let outcome = self.round(ix).await?;
            let (leader, streak) = self.store.highest_success(ix)?;

            match outcome {
                RoundOutcome::Success { winner, votes } => debug!(
                    ix,
                    round = rounds,
                    winner = winner.value(),
                    votes,
                    streak,
                    "Round succeeded"
                ),
                RoundOutcome::Failure { best_votes } => {
                    debug!(ix, round = rounds, best_votes, "Round failed");
                }
            }

            if streak >= self.config.beta {
                self.store.decide(ix, leader)?;
                info!(ix, value = leader.value(), rounds, "Decided");
                return Ok(leader);
            }
        }
    }

    /// Returns the local preference (or decision) at `ix`.
    ///
    /// This is what peers receive when they query this node.
    pub fn answer(&self, ix: Index) -> Result<Transaction> {
        preference(&self.store, ix)
    }

    /// Returns true once every index is decided.
    pub fn is_done(&self) -> bool {
        self.store.done()
    }
}

/// The answer to a peer query at `ix`, shared by the engine and its responder.
pub(crate) fn preference(store: &ConflictSetStore, ix: Index) -> Result<Transaction> {
    Ok(store.get(ix)?)
}
