//! The four graph abstraction layers.
//!
//! Layer numbers follow the node labels used by the graph store (2 through
//! 5). All "this layer and everything above it" logic goes through
//! [`Layer::upwards_from`] rather than comparing raw numbers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four abstraction levels a node can be replicated into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Point-to-point transmissions, one edge per captured frame.
    Datalink = 2,
    /// End-to-end transmissions re-keyed on network addresses.
    Network = 3,
    /// Role-annotated, timestamp-merged communication edges.
    Transport = 4,
    /// Detected end-to-end interactions.
    Application = 5,
}

impl Layer {
    /// All layers, bottom to top.
    pub const ALL: [Layer; 4] = [
        Layer::Datalink,
        Layer::Network,
        Layer::Transport,
        Layer::Application,
    ];

    /// Store label of this layer.
    pub fn label(self) -> u8 {
        self as u8
    }

    /// Reconstruct from a store label.
    pub fn from_label(label: u8) -> Option<Layer> {
        match label {
            2 => Some(Layer::Datalink),
            3 => Some(Layer::Network),
            4 => Some(Layer::Transport),
            5 => Some(Layer::Application),
            _ => None,
        }
    }

    /// The layer directly below, if any.
    pub fn below(self) -> Option<Layer> {
        match self {
            Layer::Datalink => None,
            Layer::Network => Some(Layer::Datalink),
            Layer::Transport => Some(Layer::Network),
            Layer::Application => Some(Layer::Transport),
        }
    }

    /// This layer and every layer above it, bottom to top.
    pub fn upwards_from(self) -> impl Iterator<Item = Layer> {
        Layer::ALL.into_iter().filter(move |l| *l >= self)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Layer::Datalink => "datalink",
            Layer::Network => "network",
            Layer::Transport => "transport",
            Layer::Application => "application",
        };
        write!(f, "{name}")
    }
}
