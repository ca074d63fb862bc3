//! Multi-node convergence over the in-process network.
//!
//! Five engines share one `MemoryNetwork`. Three of them start from the same
//! preferences; the other two start from values nobody else holds. Every
//! node must decide the majority's values, in order, and the termination
//! sweep must see every peer finish.

use rand::rngs::StdRng;
use rand::SeedableRng;
use snowball_consensus::{run_to_completion, ConsensusEngine, EngineConfig};
use snowball_p2p::{MemoryNetwork, PeerId, TerminationConfig, TerminationCoordinator};
use snowball_store::ConflictSetStore;
use snowball_types::Transaction;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const N: usize = 5;

fn seeds(base: i64) -> Vec<Transaction> {
    (0..N as i64).map(|i| Transaction::new(base + i)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cluster_converges_on_the_majority() {
    let network = MemoryNetwork::new();
    let roster: Vec<PeerId> = (1..=5).map(PeerId::from_port).collect();
    let starting = [seeds(10), seeds(10), seeds(10), seeds(20), seeds(30)];
    let config = EngineConfig { k: 3, alpha: 2, beta: 3 };

    let mut engines = Vec::new();
    for (i, (peer, seeds)) in roster.iter().zip(starting).enumerate() {
        let store = Arc::new(ConflictSetStore::with_seeds(seeds, "unused.txt"));
        let transport = Arc::new(network.transport(
            *peer,
            roster.iter().copied(),
            StdRng::seed_from_u64(i as u64),
        ));
        let engine = Arc::new(ConsensusEngine::new(config, store, transport).unwrap());
        network.attach(*peer, Arc::new(engine.responder()));
        engines.push(engine);
    }

    let mut tasks = Vec::new();
    for engine in &engines {
        let engine = Arc::clone(engine);
        tasks.push(tokio::spawn(async move {
            let cancel = CancellationToken::new();
            let decided = run_to_completion(&engine, Duration::ZERO, &cancel)
                .await
                .unwrap();
            let sweep = TerminationCoordinator::new(
                Arc::clone(engine.transport()),
                TerminationConfig {
                    poll_interval: Duration::from_millis(5),
                    timeout: Duration::from_secs(30),
                },
            )
            .wait_for_peers(&cancel)
            .await;
            (decided, sweep)
        }));
    }

    let expected = seeds(10);
    for task in tasks {
        let (decided, sweep) = tokio::time::timeout(Duration::from_secs(60), task)
            .await
            .expect("cluster stalled")
            .unwrap();
        assert_eq!(decided, expected);
        assert!(sweep.is_complete());
        assert_eq!(sweep.finished.len(), roster.len() - 1);
    }

    for engine in &engines {
        assert!(engine.is_done());
    }
}
