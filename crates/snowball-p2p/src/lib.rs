//! # Snowball P2P
//!
//! Peer sampling layer for Snowball.
//!
//! This crate provides everything a node needs to talk to its peers:
//!
//! - [`PeerTransport`]: the sampling interface the consensus engine uses,
//!   with two implementations, [`TcpTransport`] and [`MemoryTransport`]
//! - [`ConnectionPool`]: long-lived connections to every peer in the
//!   configured port range, selected by [`ShuffleCycle`]
//! - [`Server`]: the listener answering other peers' queries through a
//!   [`QueryHandler`]
//! - [`TerminationCoordinator`]: the shutdown handshake that keeps a node
//!   reachable until every peer has finished

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod memory;
mod peer;
mod pool;
mod selector;
mod server;
mod tcp;
mod termination;
mod transport;

pub use error::{P2pError, Result};
pub use memory::{MemoryNetwork, MemoryTransport};
pub use peer::PeerId;
pub use pool::{ConnectionPool, PeerSlot, Timeouts};
pub use selector::ShuffleCycle;
pub use server::Server;
pub use tcp::{TcpConfig, TcpTransport};
pub use termination::{SweepReport, TerminationConfig, TerminationCoordinator};
pub use transport::{PeerTransport, QueryHandler};

use std::time::Duration;

/// Failed attempts tolerated by a single [`PeerTransport::ask`] call.
pub const RETRY_BUDGET: usize = 3;

/// Default timeout for establishing a peer connection.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_millis(500);

/// Default timeout for one request/response exchange.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(2);
