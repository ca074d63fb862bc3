//! The decision loop over every index.

use crate::{ConsensusEngine, ConsensusError, Result};
use snowball_types::Transaction;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Decides every index of the engine's store, in order.
///
/// Starts from the first undecided index. A round whose sampling failed is
/// logged and retried; store errors end the loop. `round_delay` is waited
/// after every attempt.
pub async fn run_to_completion(
    engine: &ConsensusEngine,
    round_delay: Duration,
    cancel: &CancellationToken,
) -> Result<Vec<Transaction>> {
    let total = engine.store().len();
    let mut ix = engine.store().decided_count();
    info!(total, start = ix, "Starting decision loop");

    while ix < total {
        let attempt = tokio::select! {
            () = cancel.cancelled() => return Err(ConsensusError::Cancelled),
            attempt = engine.decide(ix as u64) => attempt,
        };

        match attempt {
            Ok(_) => ix += 1,
            Err(e) if e.is_recoverable() => {
                warn!(ix, error = %e, "Decision attempt failed, retrying");
            }
            Err(e) => return Err(e),
        }

        tokio::select! {
            () = cancel.cancelled() => return Err(ConsensusError::Cancelled),
            () = tokio::time::sleep(round_delay) => {}
        }
    }

    info!(decided = total, "Every index decided");
    Ok(engine.store().decided())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use snowball_p2p::{P2pError, PeerId, PeerTransport};
    use snowball_store::ConflictSetStore;
    use snowball_types::Index;
    use std::sync::Arc;

    /// Every peer prefers `ix * 10`, except for scripted outages.
    struct Flaky {
        outages: Mutex<usize>,
        asks: Mutex<usize>,
    }

    #[async_trait]
    impl PeerTransport for Flaky {
        fn peers(&self) -> Vec<PeerId> {
            vec![PeerId::from_port(1)]
        }

        fn next_peer(&self) -> Option<PeerId> {
            Some(PeerId::from_port(1))
        }

        async fn ask_one(&self, _peer: PeerId, ix: Index) -> snowball_p2p::Result<Transaction> {
            Ok(Transaction::new(ix as i64 * 10))
        }

        async fn probe_done(&self, _peer: PeerId) -> snowball_p2p::Result<bool> {
            Ok(true)
        }

        async fn ask(&self, k: usize, ix: Index) -> snowball_p2p::Result<Vec<Transaction>> {
            *self.asks.lock() += 1;
            {
                let mut outages = self.outages.lock();
                if *outages > 0 {
                    *outages -= 1;
                    return Err(P2pError::NoPeers);
                }
            }
            Ok(vec![Transaction::new(ix as i64 * 10); k])
        }
    }

    fn setup(n: usize, outages: usize) -> (ConsensusEngine, Arc<Flaky>) {
        let transport = Arc::new(Flaky {
            outages: Mutex::new(outages),
            asks: Mutex::new(0),
        });
        let store = Arc::new(ConflictSetStore::with_seeds(
            vec![Transaction::ZERO; n],
            "unused.txt",
        ));
        let config = EngineConfig { k: 3, alpha: 2, beta: 2 };
        let engine = ConsensusEngine::new(config, store, transport.clone()).unwrap();
        (engine, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn decides_every_index_in_order() {
        let (engine, _) = setup(4, 0);
        let decided = run_to_completion(&engine, Duration::from_secs(1), &CancellationToken::new())
            .await
            .unwrap();

        let values: Vec<_> = decided.iter().map(Transaction::value).collect();
        assert_eq!(values, vec![0, 10, 20, 30]);
        assert!(engine.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failures_are_retried() {
        let (engine, transport) = setup(2, 3);
        run_to_completion(&engine, Duration::from_millis(10), &CancellationToken::new())
            .await
            .unwrap();

        // Three failed attempts, then two rounds per index.
        assert_eq!(*transport.asks.lock(), 3 + 2 * 2);
        assert!(engine.is_done());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let (engine, _) = setup(2, usize::MAX);
        let cancel = CancellationToken::new();
        let stopper = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                cancel.cancel();
            })
        };

        let err = run_to_completion(&engine, Duration::from_secs(1), &cancel)
            .await
            .unwrap_err();
        stopper.await.unwrap();
        assert!(matches!(err, ConsensusError::Cancelled));
        assert_eq!(engine.store().decided_count(), 0);
    }

    #[tokio::test]
    async fn resumes_after_the_decided_prefix() {
        let (engine, transport) = setup(2, 0);
        engine.store().update(0, Transaction::new(3)).unwrap();
        engine.store().decide(0, Transaction::new(3)).unwrap();

        let decided = run_to_completion(&engine, Duration::ZERO, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(decided, vec![Transaction::new(3), Transaction::new(10)]);
        assert_eq!(*transport.asks.lock(), 2);
    }

    /// Decides each index behind the engine's back before answering.
    struct Meddler(Arc<ConflictSetStore>);

    #[async_trait]
    impl PeerTransport for Meddler {
        fn peers(&self) -> Vec<PeerId> {
            vec![PeerId::from_port(1)]
        }

        fn next_peer(&self) -> Option<PeerId> {
            Some(PeerId::from_port(1))
        }

        async fn ask_one(&self, _peer: PeerId, ix: Index) -> snowball_p2p::Result<Transaction> {
            self.0.decide(ix, Transaction::ZERO).ok();
            Ok(Transaction::ZERO)
        }

        async fn probe_done(&self, _peer: PeerId) -> snowball_p2p::Result<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn store_errors_are_fatal() {
        let store = Arc::new(ConflictSetStore::with_seeds(
            vec![Transaction::ZERO; 2],
            "unused.txt",
        ));
        let transport = Arc::new(Meddler(Arc::clone(&store)));
        let config = EngineConfig { k: 1, alpha: 1, beta: 1 };
        let engine = ConsensusEngine::new(config, store, transport).unwrap();

        let err = run_to_completion(&engine, Duration::ZERO, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::Store(_)));
    }
}
