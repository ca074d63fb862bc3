//! Termination handshake.
//!
//! A node that has committed its decisions must stay reachable until its
//! peers are done too, otherwise they lose samples and stall. The
//! [`TerminationCoordinator`] probes every peer until each one reports done
//! (or cannot be reached at all) and only then lets the listener stop.

use crate::{PeerId, PeerTransport};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Termination sweep configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationConfig {
    /// Delay between two probes of a peer that is not done yet.
    pub poll_interval: Duration,
    /// Upper bound on the whole sweep.
    pub timeout: Duration,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Outcome of a termination sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Peers that reported done.
    pub finished: Vec<PeerId>,
    /// Peers that could not be reached, counted as done.
    pub unreachable: Vec<PeerId>,
    /// Peers not confirmed done when the sweep stopped.
    pub pending: Vec<PeerId>,
}

impl SweepReport {
    /// Returns true if every peer is done or unreachable.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Probes peers until every one of them is done.
pub struct TerminationCoordinator {
    transport: Arc<dyn PeerTransport>,
    config: TerminationConfig,
}

impl std::fmt::Debug for TerminationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

enum PeerState {
    Finished,
    Unreachable,
    Pending,
}

impl TerminationCoordinator {
    /// Creates a coordinator sweeping the peers of `transport`.
    pub fn new(transport: Arc<dyn PeerTransport>, config: TerminationConfig) -> Self {
        Self { transport, config }
    }

    /// Waits until every peer is done, unreachable, or the sweep is cut
    /// short by the timeout or `cancel`.
    ///
    /// Once the timeout fires, each peer not yet swept is checked once so
    /// unreachable peers are not reported as pending. Cancellation skips
    /// that check.
    pub async fn wait_for_peers(&self, cancel: &CancellationToken) -> SweepReport {
        let deadline = Instant::now() + self.config.timeout;
        let mut report = SweepReport::default();
        let mut timed_out = false;

        for peer in self.transport.peers() {
            let state = if cancel.is_cancelled() {
                PeerState::Pending
            } else if timed_out {
                self.check_once(peer, cancel).await
            } else {
                tokio::select! {
                    () = cancel.cancelled() => PeerState::Pending,
                    state = tokio::time::timeout_at(deadline, self.wait_for(peer)) => match state {
                        Ok(state) => state,
                        Err(_) => {
                            timed_out = true;
                            self.check_once(peer, cancel).await
                        }
                    },
                }
            };
            match state {
                PeerState::Finished => report.finished.push(peer),
                PeerState::Unreachable => report.unreachable.push(peer),
                PeerState::Pending => report.pending.push(peer),
            }
        }

        if report.is_complete() {
            info!(
                finished = report.finished.len(),
                unreachable = report.unreachable.len(),
                "Every peer is done"
            );
        } else {
            warn!(
                pending = report.pending.len(),
                unreachable = report.unreachable.len(),
                "Stopped waiting for peers"
            );
        }
        report
    }

    async fn wait_for(&self, peer: PeerId) -> PeerState {
        loop {
            if let Some(state) = self.classify(peer).await {
                return state;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Single status check bounded by the poll interval.
    async fn check_once(&self, peer: PeerId, cancel: &CancellationToken) -> PeerState {
        tokio::select! {
            () = cancel.cancelled() => PeerState::Pending,
            state = tokio::time::timeout(self.config.poll_interval, self.classify(peer)) => {
                state.ok().flatten().unwrap_or(PeerState::Pending)
            }
        }
    }

    /// `None` while the peer is still deciding or answered with an error.
    async fn classify(&self, peer: PeerId) -> Option<PeerState> {
        match self.transport.probe_done(peer).await {
            Ok(true) => Some(PeerState::Finished),
            Ok(false) => {
                debug!(peer = %peer, "Peer still deciding");
                None
            }
            Err(e) if e.is_unreachable() => {
                debug!(peer = %peer, error = %e, "Peer unreachable, counted as done");
                Some(PeerState::Unreachable)
            }
            Err(e) => {
                debug!(peer = %peer, error = %e, "Probe failed");
                None
            }
        }
    }

    /// Runs the sweep, then stops the local listener.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        listener: &CancellationToken,
    ) -> SweepReport {
        let report = self.wait_for_peers(cancel).await;
        listener.cancel();
        report
    }
}
