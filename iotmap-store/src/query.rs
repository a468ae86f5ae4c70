//! Typed chain queries over transport edges.
//!
//! These replace free-form graph pattern matching with an explicit query
//! value: role constraints per position plus a hop bound. Two shapes exist
//! because the engine only ever asks two questions: "which length-2
//! forwarding chains are there?" and "which simple source-to-sink paths
//! run through a controller?".

use iotmap_core::{Layer, NodeId, Role, RoleSet, TransEdge};

/// Constraint on the role set of one chain position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleFilter {
    /// At least one of the listed roles is present.
    AnyOf(RoleSet),
    /// Every listed role is present.
    AllOf(RoleSet),
}

impl RoleFilter {
    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        RoleFilter::AnyOf(RoleSet::of(roles))
    }

    pub fn all_of(roles: impl IntoIterator<Item = Role>) -> Self {
        RoleFilter::AllOf(RoleSet::of(roles))
    }

    pub fn matches(&self, roles: &RoleSet) -> bool {
        match self {
            RoleFilter::AnyOf(wanted) => wanted.iter().any(|r| roles.contains(r)),
            RoleFilter::AllOf(wanted) => wanted.iter().all(|r| roles.contains(r)),
        }
    }
}

/// How many edges a matching chain may span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopBound {
    /// Exactly two consecutive edges: `n -> m -> d`.
    Two,
    /// Any simple path with at least two edges.
    AtLeastTwo,
}

/// A role-filtered chain query against one layer's nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainQuery {
    /// Layer whose node records supply the role sets.
    pub layer: Layer,
    pub first: RoleFilter,
    /// For [`HopBound::Two`] this constrains the middle node; for
    /// [`HopBound::AtLeastTwo`] at least one strictly-interior node must
    /// match.
    pub middle: RoleFilter,
    pub last: RoleFilter,
    pub hops: HopBound,
    /// Require the chain's endpoints to be different nodes.
    pub distinct_ends: bool,
}

/// One chain match: the visited nodes and snapshots of the edges walked.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<TransEdge>,
}

impl Chain {
    pub fn first(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn last(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}
