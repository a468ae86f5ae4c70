//! The graph itself: per-layer node records and the four edge families.
//!
//! `dlLink`/`nwkLink` edges are append-only (one per raw transmission);
//! transport and interaction edges merge on their ordered node pair. The
//! cosmetic "visual" edges collapse all links between a pair into one
//! presentational edge per layer; nothing above the layer builders reads
//! them.

use crate::error::StoreError;
use crate::query::{Chain, ChainQuery, HopBound};
use iotmap_core::{
    InteractEdge, Layer, LinkEdge, LinkKind, NodeId, NodeRecord, RoleSet, TimestampSet, TransEdge,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of an upsert-style edge write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeWrite {
    Created,
    Merged,
}

impl EdgeWrite {
    pub fn is_created(self) -> bool {
        matches!(self, EdgeWrite::Created)
    }
}

/// Edge kind tag in a results row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    Trans,
    Interact,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Trans => "TRANSEdge",
            ResultKind::Interact => "INTERACT",
        }
    }
}

/// One row of the role/edge summary over layers 4 and 5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub src_nwk: BTreeSet<String>,
    pub src_role: RoleSet,
    pub dst_nwk: BTreeSet<String>,
    pub dst_role: RoleSet,
    pub kind: ResultKind,
}

/// Full graph content, cloneable for transactional mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    nodes: BTreeMap<(Layer, NodeId), NodeRecord>,
    links: Vec<LinkEdge>,
    trans: BTreeMap<(NodeId, NodeId), TransEdge>,
    interact: BTreeMap<(NodeId, NodeId), InteractEdge>,
    visual: BTreeSet<(Layer, NodeId, NodeId)>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- nodes ----

    /// Upsert a node record by `(layer, id)`.
    pub fn create_node(&mut self, node: NodeRecord) {
        self.nodes.insert((node.layer, node.id), node);
    }

    pub fn node(&self, layer: Layer, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(&(layer, id))
    }

    pub fn node_mut(&mut self, layer: Layer, id: NodeId) -> Option<&mut NodeRecord> {
        self.nodes.get_mut(&(layer, id))
    }

    pub fn nodes_at(&self, layer: Layer) -> impl Iterator<Item = &NodeRecord> {
        self.nodes
            .range((layer, NodeId(u32::MIN))..=(layer, NodeId(u32::MAX)))
            .map(|(_, node)| node)
    }

    pub fn has_nodes_at(&self, layer: Layer) -> bool {
        self.nodes_at(layer).next().is_some()
    }

    /// Highest node id across all layers, if any node exists.
    pub fn max_id(&self) -> Option<NodeId> {
        self.nodes.keys().map(|(_, id)| *id).max()
    }

    pub fn find_by_dl(&self, layer: Layer, addr: &str) -> Option<&NodeRecord> {
        self.nodes_at(layer).find(|n| n.owns_dl(addr))
    }

    pub fn find_by_nwk(&self, layer: Layer, addr: &str) -> Option<&NodeRecord> {
        self.nodes_at(layer).find(|n| n.owns_nwk(addr))
    }

    /// Node owning both the datalink and the network address.
    pub fn find_by_dl_and_nwk(&self, layer: Layer, dl: &str, nwk: &str) -> Option<&NodeRecord> {
        self.nodes_at(layer)
            .find(|n| n.owns_dl(dl) && n.owns_nwk(nwk))
    }

    /// Upsert-copy every node at `src` into `dst`, addresses and role as
    /// of now. Roles may diverge afterwards.
    pub fn duplicate_layer(&mut self, src: Layer, dst: Layer) {
        let copies: Vec<NodeRecord> = self.nodes_at(src).map(|n| n.at_layer(dst)).collect();
        for node in copies {
            self.create_node(node);
        }
    }

    /// Delete every node and edge at `layer` and above.
    pub fn wipe_from(&mut self, layer: Layer) {
        self.nodes.retain(|(l, _), _| *l < layer);
        self.links.retain(|link| link.kind.layer() < layer);
        if layer <= Layer::Transport {
            self.trans.clear();
        }
        if layer <= Layer::Application {
            self.interact.clear();
        }
        self.visual.retain(|(l, _, _)| *l < layer);
    }

    /// Remove one node from every layer together with its incident edges.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|(_, nid), _| *nid != id);
        if self.nodes.len() == before {
            return false;
        }
        self.links.retain(|l| l.src != id && l.dst != id);
        self.trans.retain(|(s, d), _| *s != id && *d != id);
        self.interact.retain(|(s, d), _| *s != id && *d != id);
        self.visual.retain(|(_, s, d)| *s != id && *d != id);
        true
    }

    /// Create a fresh datalink-layer node owning the union of both nodes'
    /// address sets, under `max_id + 1`. The originals are kept.
    pub fn merge_nodes(&mut self, a: NodeId, b: NodeId) -> Result<NodeId, StoreError> {
        let first = self
            .node(Layer::Datalink, a)
            .ok_or(StoreError::UnknownNode(a))?;
        let second = self
            .node(Layer::Datalink, b)
            .ok_or(StoreError::UnknownNode(b))?;

        let dl: Vec<String> = first
            .dl_addrs
            .union(&second.dl_addrs)
            .cloned()
            .collect();
        let nwk: Vec<String> = first
            .nwk_addrs
            .union(&second.nwk_addrs)
            .cloned()
            .collect();

        let id = NodeId(self.max_id().map_or(0, |NodeId(n)| n) + 1);
        self.create_node(NodeRecord::new(id, Layer::Datalink, dl, nwk));
        Ok(id)
    }

    // ---- edges ----

    /// Append one link edge; duplicates are the caller's intent.
    pub fn add_link(&mut self, link: LinkEdge) {
        self.links.push(link);
    }

    pub fn links(&self, kind: LinkKind) -> impl Iterator<Item = &LinkEdge> {
        self.links.iter().filter(move |l| l.kind == kind)
    }

    pub fn link_count(&self, kind: LinkKind) -> usize {
        self.links(kind).count()
    }

    /// Drop every link edge of one kind, keeping the node population.
    pub fn clear_links(&mut self, kind: LinkKind) {
        self.links.retain(|l| l.kind != kind);
    }

    /// Drop the presentational edges of one layer.
    pub fn clear_visual(&mut self, layer: Layer) {
        self.visual.retain(|(l, _, _)| *l != layer);
    }

    /// Collapse a presentational edge for the pair; true when new.
    pub fn merge_visual(&mut self, layer: Layer, src: NodeId, dst: NodeId) -> bool {
        self.visual.insert((layer, src, dst))
    }

    pub fn visual_count(&self, layer: Layer) -> usize {
        self.visual.iter().filter(|(l, _, _)| *l == layer).count()
    }

    /// Upsert a transport edge on its ordered pair; timestamps merge on
    /// repeat, addresses stay as of creation.
    pub fn merge_trans_edge(&mut self, edge: TransEdge) -> EdgeWrite {
        match self.trans.entry((edge.src, edge.dst)) {
            std::collections::btree_map::Entry::Occupied(mut existing) => {
                existing.get_mut().timestamps.merge(&edge.timestamps);
                EdgeWrite::Merged
            }
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(edge);
                EdgeWrite::Created
            }
        }
    }

    pub fn trans_edges(&self) -> impl Iterator<Item = &TransEdge> {
        self.trans.values()
    }

    pub fn trans_edge(&self, src: NodeId, dst: NodeId) -> Option<&TransEdge> {
        self.trans.get(&(src, dst))
    }

    /// Upsert an interaction edge; existence alone is the record.
    pub fn merge_interact_edge(&mut self, edge: InteractEdge) -> EdgeWrite {
        match self.interact.entry((edge.src, edge.dst)) {
            std::collections::btree_map::Entry::Occupied(_) => EdgeWrite::Merged,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(edge);
                EdgeWrite::Created
            }
        }
    }

    pub fn interact_edges(&self) -> impl Iterator<Item = &InteractEdge> {
        self.interact.values()
    }

    // ---- queries ----

    /// Sorted distinct timestamp sets grouped by ordered node pair.
    pub fn grouped_timestamps(&self, kind: LinkKind) -> BTreeMap<(NodeId, NodeId), TimestampSet> {
        let mut grouped: BTreeMap<(NodeId, NodeId), TimestampSet> = BTreeMap::new();
        for link in self.links(kind) {
            grouped
                .entry((link.src, link.dst))
                .or_default()
                .insert(link.tx.timestamp);
        }
        grouped
    }

    fn role_of(&self, layer: Layer, id: NodeId) -> RoleSet {
        self.node(layer, id)
            .map(|n| n.role.clone())
            .unwrap_or_default()
    }

    /// Role-filtered chains over the transport edges.
    pub fn chains(&self, query: &ChainQuery) -> Vec<Chain> {
        match query.hops {
            HopBound::Two => self.two_hop_chains(query),
            HopBound::AtLeastTwo => self.simple_path_chains(query),
        }
    }

    fn adjacency(&self) -> BTreeMap<NodeId, Vec<&TransEdge>> {
        let mut adjacency: BTreeMap<NodeId, Vec<&TransEdge>> = BTreeMap::new();
        for edge in self.trans.values() {
            adjacency.entry(edge.src).or_default().push(edge);
        }
        adjacency
    }

    fn two_hop_chains(&self, query: &ChainQuery) -> Vec<Chain> {
        let adjacency = self.adjacency();
        let mut out = Vec::new();
        for first_edge in self.trans.values() {
            let (n, m) = (first_edge.src, first_edge.dst);
            if !query.first.matches(&self.role_of(query.layer, n)) {
                continue;
            }
            if !query.middle.matches(&self.role_of(query.layer, m)) {
                continue;
            }
            let Some(seconds) = adjacency.get(&m) else {
                continue;
            };
            for second_edge in seconds {
                let d = second_edge.dst;
                if query.distinct_ends && n == d {
                    continue;
                }
                if !query.last.matches(&self.role_of(query.layer, d)) {
                    continue;
                }
                out.push(Chain {
                    nodes: vec![n, m, d],
                    edges: vec![first_edge.clone(), (*second_edge).clone()],
                });
            }
        }
        out
    }

    fn simple_path_chains(&self, query: &ChainQuery) -> Vec<Chain> {
        let adjacency = self.adjacency();
        let mut out = Vec::new();
        let starts: Vec<NodeId> = self
            .nodes_at(query.layer)
            .filter(|n| query.first.matches(&n.role))
            .map(|n| n.id)
            .collect();
        for start in starts {
            let mut visited = BTreeSet::from([start]);
            let mut nodes = vec![start];
            let mut edges = Vec::new();
            self.extend_path(
                start,
                &adjacency,
                query,
                &mut visited,
                &mut nodes,
                &mut edges,
                &mut out,
            );
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn extend_path(
        &self,
        current: NodeId,
        adjacency: &BTreeMap<NodeId, Vec<&TransEdge>>,
        query: &ChainQuery,
        visited: &mut BTreeSet<NodeId>,
        nodes: &mut Vec<NodeId>,
        edges: &mut Vec<TransEdge>,
        out: &mut Vec<Chain>,
    ) {
        let Some(nexts) = adjacency.get(&current) else {
            return;
        };
        for edge in nexts {
            if visited.contains(&edge.dst) {
                continue;
            }
            visited.insert(edge.dst);
            nodes.push(edge.dst);
            edges.push((*edge).clone());

            let interior_matches = nodes[1..nodes.len() - 1]
                .iter()
                .any(|mid| query.middle.matches(&self.role_of(query.layer, *mid)));
            if edges.len() >= 2
                && interior_matches
                && query.last.matches(&self.role_of(query.layer, edge.dst))
            {
                out.push(Chain {
                    nodes: nodes.clone(),
                    edges: edges.clone(),
                });
            }

            self.extend_path(edge.dst, adjacency, query, visited, nodes, edges, out);

            visited.remove(&edge.dst);
            nodes.pop();
            edges.pop();
        }
    }

    /// Summary rows over layers 4 and 5: addresses, roles, edge kind.
    pub fn results(&self) -> Vec<ResultRow> {
        let mut rows = Vec::new();
        for edge in self.trans.values() {
            rows.push(ResultRow {
                src_nwk: edge.nwk_src.clone(),
                src_role: self.role_of(Layer::Transport, edge.src),
                dst_nwk: edge.nwk_dst.clone(),
                dst_role: self.role_of(Layer::Transport, edge.dst),
                kind: ResultKind::Trans,
            });
        }
        for edge in self.interact.values() {
            rows.push(ResultRow {
                src_nwk: edge.nwk_src.clone(),
                src_role: self.role_of(Layer::Application, edge.src),
                dst_nwk: edge.nwk_dst.clone(),
                dst_role: self.role_of(Layer::Application, edge.dst),
                kind: ResultKind::Interact,
            });
        }
        rows
    }
}
