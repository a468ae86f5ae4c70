//! Node identity and per-layer node records.

use crate::{Layer, RoleSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable device identifier, unique across the whole node population.
///
/// The same id names the same physical device on every layer it has been
/// duplicated into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One physical device as seen by one graph layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub layer: Layer,
    /// Datalink addresses owned by the device; several after a merge.
    pub dl_addrs: BTreeSet<String>,
    /// Network addresses owned by the device.
    pub nwk_addrs: BTreeSet<String>,
    pub role: RoleSet,
}

impl NodeRecord {
    pub fn new(
        id: NodeId,
        layer: Layer,
        dl_addrs: impl IntoIterator<Item = String>,
        nwk_addrs: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id,
            layer,
            dl_addrs: dl_addrs.into_iter().collect(),
            nwk_addrs: nwk_addrs.into_iter().collect(),
            role: RoleSet::new(),
        }
    }

    pub fn owns_dl(&self, addr: &str) -> bool {
        self.dl_addrs.contains(addr)
    }

    pub fn owns_nwk(&self, addr: &str) -> bool {
        self.nwk_addrs.contains(addr)
    }

    /// Copy of this record re-homed at `layer`, addresses and role as of now.
    pub fn at_layer(&self, layer: Layer) -> NodeRecord {
        NodeRecord {
            layer,
            ..self.clone()
        }
    }
}
