//! Query answering from the local store.

use crate::engine::preference;
use snowball_p2p::{P2pError, QueryHandler};
use snowball_store::ConflictSetStore;
use snowball_types::{Index, Transaction};
use std::sync::Arc;

/// Answers peer queries with the local preference.
///
/// Holds the store rather than the engine, so the transport the engine owns
/// never keeps the engine alive.
#[derive(Debug, Clone)]
pub struct StoreResponder {
    store: Arc<ConflictSetStore>,
}

impl StoreResponder {
    /// Creates a responder reading from `store`.
    pub fn new(store: Arc<ConflictSetStore>) -> Self {
        Self { store }
    }
}

impl QueryHandler for StoreResponder {
    fn answer(&self, ix: Index) -> snowball_p2p::Result<Transaction> {
        preference(&self.store, ix).map_err(|e| P2pError::Handler(e.to_string()))
    }

    fn is_done(&self) -> bool {
        self.store.done()
    }
}
