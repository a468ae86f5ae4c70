use iotmap_core::NodeId;
use thiserror::Error;

/// Errors surfaced by store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
}
