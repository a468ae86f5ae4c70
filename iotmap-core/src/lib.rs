//! # iotmap-core
//!
//! Shared data model for the IoTMap graph layers.
//!
//! Every higher crate speaks in these types: nodes replicated per layer,
//! role sets mutated during correlation, the unified transmission tuple
//! produced by protocol decoders, and the per-layer edge variants.
//!
//! ### Key Submodules:
//! - `layer`: the explicit, ordered four-layer sequence
//! - `role`: source/sink/controller sets with `union`/`overwrite` mutators
//! - `transmission`: the unified 8-tuple fed into the datalink builder
//! - `edge`: per-layer edge variants (append-only links, merged edges)
//! - `timeset`: sorted, distinct timestamp sets

pub mod edge;
pub mod error;
pub mod layer;
pub mod node;
pub mod role;
pub mod timeset;
pub mod transmission;

pub use edge::{InteractEdge, LinkEdge, LinkKind, TransEdge};
pub use error::CoreError;
pub use layer::Layer;
pub use node::{NodeId, NodeRecord};
pub use role::{Role, RoleSet};
pub use timeset::TimestampSet;
pub use transmission::{AppType, Protocol, Transmission};
