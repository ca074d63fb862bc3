//! Node assembly and lifecycle.

use crate::config::{ConfigError, NodeConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snowball_consensus::{run_to_completion, ConsensusEngine, ConsensusError, StoreResponder};
use snowball_p2p::{
    P2pError, PeerTransport, Server, SweepReport, TcpTransport, TerminationCoordinator,
};
use snowball_store::{output_path, run_name, ConflictSetStore, StoreError, RUN_NAME_LEN};
use snowball_types::Transaction;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Errors that stop a node.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Networking failure.
    #[error(transparent)]
    P2p(#[from] P2pError),

    /// Consensus failure.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The decided sequence.
    pub decided: Vec<Transaction>,
    /// Where the decided sequence was written.
    pub output: PathBuf,
    /// Outcome of the termination handshake.
    pub sweep: SweepReport,
}

/// A started Snowball node: listening, connected, ready to decide.
pub struct Node {
    config: NodeConfig,
    engine: ConsensusEngine,
    local_addr: SocketAddr,
    listener: CancellationToken,
    server: JoinHandle<()>,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("local_addr", &self.local_addr)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl Node {
    /// Validates `config`, binds the listener and dials every peer.
    pub async fn start(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut store_rng = StdRng::seed_from_u64(rng.gen());
        let pool_rng = StdRng::seed_from_u64(rng.gen());

        let run = match &config.run_name {
            Some(run) => run.clone(),
            None => run_name(&mut rng, RUN_NAME_LEN),
        };
        let output = output_path(&config.folder, &run, config.port);
        let store = Arc::new(ConflictSetStore::new(config.n, output, &mut store_rng));

        // Serve peers before dialing them: a node still dialing must not
        // stall peers that already sample it.
        let server = Server::bind(SocketAddr::new(config.host, config.port)).await?;
        let local_addr = server.local_addr()?;
        let listener = CancellationToken::new();
        let stop_on_error = listener.clone().drop_guard();
        let server = server.spawn(
            Arc::new(StoreResponder::new(Arc::clone(&store))),
            listener.clone(),
        );

        let transport: Arc<dyn PeerTransport> =
            Arc::new(TcpTransport::connect(&config.tcp(), pool_rng).await);
        let engine = ConsensusEngine::new(config.engine(), store, transport)?;
        stop_on_error.disarm();

        info!(
            addr = %local_addr,
            run = %run,
            n = config.n,
            k = config.k,
            alpha = config.alpha,
            beta = config.beta,
            "Node started"
        );

        Ok(Self {
            config,
            engine,
            local_addr,
            listener,
            server,
        })
    }

    /// Returns the listen address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns where the decided sequence will be written.
    pub fn output(&self) -> PathBuf {
        self.engine.store().output().to_path_buf()
    }

    /// Returns the consensus engine.
    pub fn engine(&self) -> &ConsensusEngine {
        &self.engine
    }

    /// Decides every index, commits, and waits for the peers to finish.
    ///
    /// The listener keeps answering peers until the termination sweep is
    /// over, and is stopped on every exit path.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunReport, NodeError> {
        let _listener = self.listener.clone().drop_guard();

        let decided = run_to_completion(&self.engine, self.config.round_delay(), &cancel).await?;
        let output = self.engine.store().commit()?;
        info!(path = %output.display(), "Committed");

        let sweep = TerminationCoordinator::new(
            Arc::clone(self.engine.transport()),
            self.config.termination(),
        )
        .run(&cancel, &self.listener)
        .await;

        if let Err(e) = self.server.await {
            warn!(error = %e, "Server task ended abnormally");
        }

        Ok(RunReport {
            decided,
            output,
            sweep,
        })
    }
}
