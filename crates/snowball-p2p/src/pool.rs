//! Connection pooling over the peer port range.

use crate::{P2pError, PeerId, Result, ShuffleCycle, DEFAULT_DIAL_TIMEOUT, DEFAULT_IO_TIMEOUT};
use futures::future::join_all;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use snowball_protocol::{read_response, write_frame, Request, Response};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Timeouts applied to peer connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Timeout for establishing a connection.
    pub dial: Duration,
    /// Timeout for one request/response exchange.
    pub io: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            dial: DEFAULT_DIAL_TIMEOUT,
            io: DEFAULT_IO_TIMEOUT,
        }
    }
}

/// One peer of the pool and its (possibly absent) connection.
///
/// The connection sits behind its own lock, so request and response frames
/// of concurrent exchanges with the same peer never interleave.
#[derive(Debug)]
pub struct PeerSlot {
    id: PeerId,
    addr: SocketAddr,
    stream: tokio::sync::Mutex<Option<TcpStream>>,
    connected: AtomicBool,
}

impl PeerSlot {
    fn new(id: PeerId, addr: SocketAddr, stream: Option<TcpStream>) -> Self {
        Self {
            id,
            addr,
            connected: AtomicBool::new(stream.is_some()),
            stream: tokio::sync::Mutex::new(stream),
        }
    }

    /// Returns the peer identifier.
    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Returns the peer address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns true if a live connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn dial(id: PeerId, addr: SocketAddr, timeout: Duration) -> Result<TcpStream> {
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(P2pError::Dial { peer: id, source }),
            Err(_) => {
                return Err(P2pError::Dial {
                    peer: id,
                    source: std::io::ErrorKind::TimedOut.into(),
                })
            }
        };
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// Sends one request and waits for its response.
    ///
    /// Reuses the pooled connection, or dials a new one if there is none.
    /// Any failure drops the connection, so the next exchange redials.
    pub async fn exchange(&self, request: Request, timeouts: Timeouts) -> Result<Response> {
        let frame = request.encode()?;
        let mut guard = self.stream.lock().await;

        // Taken out for the duration of the exchange: if this future is
        // dropped mid-flight the half-used stream goes with it.
        let mut stream = match guard.take() {
            Some(stream) => stream,
            None => {
                let stream = Self::dial(self.id, self.addr, timeouts.dial).await?;
                debug!(peer = %self.id, "Connected to peer");
                stream
            }
        };
        self.connected.store(false, Ordering::Release);

        let exchanged = tokio::time::timeout(timeouts.io, async {
            write_frame(&mut stream, &frame).await?;
            read_response(&mut stream).await
        })
        .await;

        match exchanged {
            Ok(Ok(response)) => {
                *guard = Some(stream);
                self.connected.store(true, Ordering::Release);
                Ok(response)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(P2pError::Timeout(self.id)),
        }
    }
}

/// Connections to every peer in a port range.
///
/// Peers are dialed eagerly when the pool is built. Peers that cannot be
/// reached yet keep an empty slot and are dialed on first use, so the pool
/// tolerates nodes starting in any order.
#[derive(Debug)]
pub struct ConnectionPool {
    slots: Vec<Arc<PeerSlot>>,
    selector: Mutex<ShuffleCycle>,
    timeouts: Timeouts,
}

impl ConnectionPool {
    /// Dials every peer in `peers` and builds the pool.
    ///
    /// Peers are dialed concurrently, so building the pool takes at most one
    /// dial timeout.
    pub async fn connect(
        peers: impl IntoIterator<Item = (PeerId, SocketAddr)>,
        timeouts: Timeouts,
        rng: StdRng,
    ) -> Self {
        let dials = peers.into_iter().map(|(id, addr)| async move {
            let stream = match PeerSlot::dial(id, addr, timeouts.dial).await {
                Ok(stream) => Some(stream),
                Err(e) => {
                    warn!(peer = %id, addr = %addr, error = %e, "Cannot dial peer");
                    None
                }
            };
            Arc::new(PeerSlot::new(id, addr, stream))
        });
        let mut slots = join_all(dials).await;
        slots.sort_by_key(|slot| slot.id);

        let pool = Self {
            selector: Mutex::new(ShuffleCycle::new(slots.len(), rng)),
            slots,
            timeouts,
        };
        info!(
            connected = pool.connected(),
            peers = pool.len(),
            "Connection pool ready"
        );
        pool
    }

    /// Returns the next peer drawn by shuffle-and-cycle selection.
    pub fn random(&self) -> Option<Arc<PeerSlot>> {
        let position = self.selector.lock().next()?;
        self.slots.get(position).cloned()
    }

    /// Returns the peer at position `i`.
    pub fn get(&self, i: usize) -> Option<Arc<PeerSlot>> {
        self.slots.get(i).cloned()
    }

    /// Returns the slot of `peer`.
    pub fn slot(&self, peer: PeerId) -> Option<Arc<PeerSlot>> {
        self.slots
            .binary_search_by_key(&peer, |slot| slot.id)
            .ok()
            .map(|i| Arc::clone(&self.slots[i]))
    }

    /// Returns the number of peers, connected or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the pool has no peers.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of peers with a live connection.
    pub fn connected(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_connected()).count()
    }

    /// Returns every peer identifier, in positional order.
    pub fn peers(&self) -> Vec<PeerId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    /// Returns the timeouts applied to exchanges.
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}
