//! TCP peer transport.

use crate::{ConnectionPool, P2pError, PeerId, PeerTransport, Result, Timeouts};
use async_trait::async_trait;
use rand::rngs::StdRng;
use snowball_protocol::Request;
use snowball_types::{Index, Transaction};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

/// TCP transport configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpConfig {
    /// Host every peer listens on.
    pub host: IpAddr,
    /// This node's own port, excluded from the peer set.
    pub port: u16,
    /// First port of the peer range (inclusive).
    pub min_port: u16,
    /// End of the peer range (exclusive).
    pub max_port: u16,
    /// Connection and exchange timeouts.
    pub timeouts: Timeouts,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 60000,
            min_port: 60000,
            max_port: 60200,
            timeouts: Timeouts::default(),
        }
    }
}

impl TcpConfig {
    /// Returns the peer port range.
    pub fn port_range(&self) -> Range<u16> {
        self.min_port..self.max_port
    }

    /// Returns every peer of the range except this node.
    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.port_range()
            .filter(move |port| *port != self.port)
            .map(PeerId::from_port)
    }

    /// Sets the dial timeout.
    #[must_use]
    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.dial = timeout;
        self
    }

    /// Sets the exchange timeout.
    #[must_use]
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.io = timeout;
        self
    }
}

/// Samples peers over long-lived TCP connections.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    pool: Arc<ConnectionPool>,
}

impl TcpTransport {
    /// Dials every peer in the configured range.
    pub async fn connect(config: &TcpConfig, rng: StdRng) -> Self {
        let peers = config.peers().map(|id| (id, id.addr(config.host)));
        let pool = ConnectionPool::connect(peers, config.timeouts, rng).await;
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

#[async_trait]
impl PeerTransport for TcpTransport {
    fn peers(&self) -> Vec<PeerId> {
        self.pool.peers()
    }

    fn next_peer(&self) -> Option<PeerId> {
        self.pool.random().map(|slot| slot.id())
    }

    async fn ask_one(&self, peer: PeerId, ix: Index) -> Result<Transaction> {
        let slot = self.pool.slot(peer).ok_or(P2pError::UnknownPeer(peer))?;
        let response = slot.exchange(Request::Query(ix), self.pool.timeouts()).await?;
        Ok(Transaction::new(response.value()))
    }

    async fn probe_done(&self, peer: PeerId) -> Result<bool> {
        let slot = self.pool.slot(peer).ok_or(P2pError::UnknownPeer(peer))?;
        let response = slot.exchange(Request::Probe, self.pool.timeouts()).await?;
        Ok(response.is_done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_port_is_excluded() {
        let config = TcpConfig {
            port: 40002,
            min_port: 40000,
            max_port: 40005,
            ..TcpConfig::default()
        };
        let peers: Vec<_> = config.peers().map(|p| p.port()).collect();
        assert_eq!(peers, vec![40000, 40001, 40003, 40004]);
    }

    #[test]
    fn port_outside_range_keeps_every_peer() {
        let config = TcpConfig {
            port: 50000,
            min_port: 40000,
            max_port: 40003,
            ..TcpConfig::default()
        };
        assert_eq!(config.peers().count(), 3);
    }

    #[test]
    fn builder_sets_timeouts() {
        let config = TcpConfig::default()
            .with_dial_timeout(Duration::from_millis(10))
            .with_io_timeout(Duration::from_millis(20));
        assert_eq!(config.timeouts.dial, Duration::from_millis(10));
        assert_eq!(config.timeouts.io, Duration::from_millis(20));
    }
}
