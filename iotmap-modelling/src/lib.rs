//! # iotmap-modelling
//!
//! The layered graph-construction and role-inference engine.
//!
//! Raw transmissions become point-to-point datalink edges, collapse into
//! end-to-end network edges, correlate into role-annotated transport
//! edges, and finally yield application-level interaction edges. Each
//! layer's construction strategy is a named pattern; a rebuild of layer L
//! cascades through the layers below it and runs inside one store
//! transaction.
//!
//! ### Key Submodules:
//! - `datalink` / `network` / `transport` / `application`: the builders
//! - `patterns`: the per-layer registry of named strategies
//! - `modeller`: the rebuild cascade driving builders through the store

pub mod application;
pub mod datalink;
pub mod error;
pub mod modeller;
pub mod network;
pub mod patterns;
pub mod transport;

pub use error::ModelError;
pub use modeller::{Modeller, ModellingParams, RebuildReport};
pub use patterns::{Pattern, PatternFn, PatternOutput, PatternParams, PatternRegistry};
pub use transport::{ControllerRecord, ResponseRecord};
