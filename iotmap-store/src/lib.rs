//! # iotmap-store
//!
//! Graph persistence for the layered topology model.
//!
//! The layer builders only ever talk to the [`GraphStore`] contract: a
//! transaction boundary around a [`GraphState`] exposing node upserts,
//! layer duplication, at-or-above wipes, edge writes, and the two query
//! shapes the correlation algorithms need (grouped timestamps and
//! role-filtered chains). [`MemoryStore`] is the bundled implementation:
//! all mutation happens on a clone of the state that is committed only
//! when the transaction closure succeeds, so a failed rebuild leaves no
//! partial write visible.

pub mod error;
pub mod memory;
pub mod query;
pub mod state;

pub use error::StoreError;
pub use memory::{GraphStore, MemoryStore};
pub use query::{Chain, ChainQuery, HopBound, RoleFilter};
pub use state::{EdgeWrite, GraphState, ResultKind, ResultRow};
