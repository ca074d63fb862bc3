//! Snowball Consensus Engine
//!
//! This crate drives the Snowball repeated-sampling protocol: for every
//! decision index a node repeatedly samples `k` peers for their preference,
//! reinforces the value that wins a quorum of `alpha` answers, and decides
//! once one candidate has won `beta` consecutive rounds.
//!
//! # Components
//!
//! - [`ConsensusEngine`]: one index at a time, sample, tally, update, decide
//! - [`EngineConfig`]: the `k`, `alpha` and `beta` thresholds
//! - [`StoreResponder`]: answers peer queries from the local store
//! - [`run_to_completion`]: decides every index in order, retrying rounds
//!   whose sampling failed
//!
//! # Decision Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Sample k    │────▶│    Tally     │────▶│  >= alpha ?  │
//! │   peers      │     │  (ordered)   │     │              │
//! └──────────────┘     └──────────────┘     └──────┬───────┘
//!        ▲                                  yes /  │ \ no
//!        │                            update(winner) update_failed
//!        │                                         │
//!        │                                         ▼
//!        │                                  ┌──────────────┐
//!        └──────────────── no ──────────────│ streak >=    │
//!                                           │   beta ?     │
//!                                           └──────┬───────┘
//!                                                  │ yes
//!                                                  ▼
//!                                           ┌──────────────┐
//!                                           │    decide    │
//!                                           └──────────────┘
//! ```

mod driver;
mod engine;
mod error;
mod responder;
mod tally;

pub use driver::run_to_completion;
pub use engine::{ConsensusEngine, EngineConfig, RoundOutcome};
pub use error::{ConsensusError, Result};
pub use responder::StoreResponder;
