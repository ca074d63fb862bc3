//! Peer identifiers.

use std::net::{IpAddr, SocketAddr};

/// A peer identifier.
///
/// Peers live on a fixed port range, so the listen port identifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeerId(u16);

impl PeerId {
    /// Creates the identifier of the peer listening on `port`.
    #[must_use]
    pub const fn from_port(port: u16) -> Self {
        Self(port)
    }

    /// Returns the peer's listen port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.0
    }

    /// Returns the peer's socket address on `host`.
    #[must_use]
    pub fn addr(&self, host: IpAddr) -> SocketAddr {
        SocketAddr::new(host, self.0)
    }
}

impl From<u16> for PeerId {
    fn from(port: u16) -> Self {
        Self::from_port(port)
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
