//! Per-layer edge variants.
//!
//! Datalink and network links are append-only, one per raw transmission.
//! Transport and interaction edges are merged: at most one per ordered node
//! pair within their layer.

use crate::{Layer, NodeId, TimestampSet, Transmission};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which link layer an append-only edge belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkKind {
    /// `dlLink`, point-to-point (layer 2).
    Dl,
    /// `nwkLink`, end-to-end (layer 3).
    Nwk,
}

impl LinkKind {
    pub fn layer(self) -> Layer {
        match self {
            LinkKind::Dl => Layer::Datalink,
            LinkKind::Nwk => Layer::Network,
        }
    }
}

/// Append-only edge carrying the full transmission property set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub kind: LinkKind,
    pub src: NodeId,
    pub dst: NodeId,
    pub tx: Transmission,
}

/// Merged transport edge: all traffic of one ordered node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransEdge {
    pub src: NodeId,
    pub dst: NodeId,
    /// Network addresses of the endpoints as of edge creation.
    pub nwk_src: BTreeSet<String>,
    pub nwk_dst: BTreeSet<String>,
    pub timestamps: TimestampSet,
}

/// Detected end-to-end interaction; existence alone is the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractEdge {
    pub src: NodeId,
    pub dst: NodeId,
    pub nwk_src: BTreeSet<String>,
    pub nwk_dst: BTreeSet<String>,
}
