//! # Snowball Node
//!
//! A node of the Snowball repeated-sampling consensus network.
//!
//! A node listens on one port of a shared localhost port range, samples the
//! other ports for their preferences, and decides `n` values in order. Once
//! done it writes the decided sequence to
//! `<folder>/<run-name>/<port>.txt` and keeps answering its peers until
//! every one of them is done too.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Snowball Node                      │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌───────────────┐         ┌─────────────────────────┐  │
//! │  │    Server     │         │    Decision loop        │  │
//! │  │  (answers     │         │  sample ─ tally ─ vote  │  │
//! │  │   peers)      │         │  (ConsensusEngine)      │  │
//! │  └───────┬───────┘         └───────┬─────────┬───────┘  │
//! │          │ reads                    │ writes  │ asks     │
//! │  ┌───────▼──────────────────────────▼──┐ ┌────▼───────┐  │
//! │  │          ConflictSetStore           │ │ Connection │  │
//! │  │  candidates · streaks · decisions   │ │    pool    │  │
//! │  └─────────────────────────────────────┘ └────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod config;
mod node;
pub mod observability;

pub use config::{ConfigError, NodeConfig};
pub use node::{Node, NodeError, RunReport};
