//! In-process peer transport.
//!
//! Nodes attach their [`QueryHandler`] to a shared [`MemoryNetwork`] and
//! sample each other through direct calls. Used for simulations and tests
//! that need many nodes without sockets.

use crate::{P2pError, PeerId, PeerTransport, QueryHandler, Result, ShuffleCycle};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use snowball_protocol::{Request, Response};
use snowball_types::{Index, Transaction};
use std::collections::HashMap;
use std::sync::Arc;

/// A set of in-process peers.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    handlers: Arc<RwLock<HashMap<PeerId, Arc<dyn QueryHandler>>>>,
}

impl std::fmt::Debug for MemoryNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNetwork")
            .field("attached", &self.handlers.read().len())
            .finish()
    }
}

impl MemoryNetwork {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `peer` reachable, answering through `handler`.
    pub fn attach(&self, peer: PeerId, handler: Arc<dyn QueryHandler>) {
        self.handlers.write().insert(peer, handler);
    }

    /// Makes `peer` unreachable.
    pub fn detach(&self, peer: PeerId) {
        self.handlers.write().remove(&peer);
    }

    /// Returns true if `peer` is attached.
    pub fn is_attached(&self, peer: PeerId) -> bool {
        self.handlers.read().contains_key(&peer)
    }

    /// Creates the transport of `local`, sampling from `roster`.
    ///
    /// `local` is removed from the roster if present.
    pub fn transport(
        &self,
        local: PeerId,
        roster: impl IntoIterator<Item = PeerId>,
        rng: StdRng,
    ) -> MemoryTransport {
        let mut peers: Vec<PeerId> = roster.into_iter().filter(|p| *p != local).collect();
        peers.sort();
        peers.dedup();
        MemoryTransport {
            network: self.clone(),
            selector: Mutex::new(ShuffleCycle::new(peers.len(), rng)),
            peers,
        }
    }

    fn call(&self, peer: PeerId, request: Request) -> Result<Response> {
        let handler = self
            .handlers
            .read()
            .get(&peer)
            .cloned()
            .ok_or_else(|| P2pError::Dial {
                peer,
                source: std::io::ErrorKind::ConnectionRefused.into(),
            })?;
        handler.respond(request)
    }
}

/// One node's view of a [`MemoryNetwork`].
#[derive(Debug)]
pub struct MemoryTransport {
    network: MemoryNetwork,
    peers: Vec<PeerId>,
    selector: Mutex<ShuffleCycle>,
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    fn peers(&self) -> Vec<PeerId> {
        self.peers.clone()
    }

    fn next_peer(&self) -> Option<PeerId> {
        let position = self.selector.lock().next()?;
        self.peers.get(position).copied()
    }

    async fn ask_one(&self, peer: PeerId, ix: Index) -> Result<Transaction> {
        tokio::task::yield_now().await;
        let response = self.network.call(peer, Request::Query(ix))?;
        Ok(Transaction::new(response.value()))
    }

    async fn probe_done(&self, peer: PeerId) -> Result<bool> {
        tokio::task::yield_now().await;
        Ok(self.network.call(peer, Request::Probe)?.is_done())
    }
}
