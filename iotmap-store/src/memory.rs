//! In-memory store with a serializable write-transaction boundary.

use crate::state::GraphState;
use parking_lot::Mutex;
use tracing::trace;

/// The persistence contract the layer builders depend on.
///
/// Transactions are atomic and serializable with respect to each other: a
/// closure either commits in full or leaves the store untouched. There is
/// no retry policy here; a failed transaction is the caller's error.
pub trait GraphStore {
    /// Run `f` against a mutable view of the graph; commit only on `Ok`.
    fn run_in_transaction<T, E>(
        &self,
        f: impl FnOnce(&mut GraphState) -> Result<T, E>,
    ) -> Result<T, E>;

    /// A read-only copy of the current graph content.
    fn snapshot(&self) -> GraphState;
}

/// Bundled store implementation holding the whole graph in memory.
///
/// Mutation happens on a clone of the state behind a mutex; the clone is
/// swapped in only when the transaction closure succeeds, so concurrent
/// readers never observe a partial rebuild.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<GraphState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reopen a store around previously exported graph content.
    pub fn from_state(state: GraphState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl GraphStore for MemoryStore {
    fn run_in_transaction<T, E>(
        &self,
        f: impl FnOnce(&mut GraphState) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut guard = self.state.lock();
        let mut working = guard.clone();
        let value = f(&mut working)?;
        *guard = working;
        trace!("transaction committed");
        Ok(value)
    }

    fn snapshot(&self) -> GraphState {
        self.state.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotmap_core::{Layer, NodeId, NodeRecord};

    fn node(id: u32) -> NodeRecord {
        NodeRecord::new(
            NodeId(id),
            Layer::Datalink,
            ["0x1".to_string()],
            ["0x1".to_string()],
        )
    }

    #[test]
    fn commit_on_ok() {
        let store = MemoryStore::new();
        store
            .run_in_transaction(|g| -> Result<(), ()> {
                g.create_node(node(1));
                Ok(())
            })
            .unwrap();
        assert!(store.snapshot().has_nodes_at(Layer::Datalink));
    }

    #[test]
    fn rollback_on_err() {
        let store = MemoryStore::new();
        let result = store.run_in_transaction(|g| -> Result<(), &'static str> {
            g.create_node(node(1));
            Err("boom")
        });
        assert_eq!(result, Err("boom"));
        assert!(!store.snapshot().has_nodes_at(Layer::Datalink));
    }
}
