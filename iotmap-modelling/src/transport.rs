//! Transport layer builder: two-phase timing correlation.
//!
//! Phase 1 classifies every ordered node pair carrying network traffic as
//! one-way or request/response and materializes role-annotated,
//! timestamp-merged transport edges. Phase 2 walks length-2 chains through
//! nodes that both send and receive and promotes them to controllers when
//! the forwarding delay fits inside the window.
//!
//! The one-way/bidirectional classification and the request/response role
//! assignment are deliberately asymmetric; this module reproduces the
//! observed behavior of the heuristic exactly, including which writes
//! union roles and which overwrite them.

use crate::error::ModelError;
use crate::patterns::{PatternOutput, PatternParams};
use iotmap_core::{Layer, LinkKind, NodeId, Role, RoleSet, TimestampSet, TransEdge};
use iotmap_store::{ChainQuery, GraphState, HopBound, RoleFilter};
use std::collections::BTreeMap;
use tracing::debug;

/// One detected request/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub responder: NodeId,
    pub request_at: f64,
    pub requester: NodeId,
    pub response_at: f64,
}

/// One detected forwarding chain through a controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerRecord {
    pub origin: NodeId,
    pub sent_at: f64,
    pub controller: NodeId,
    pub forwarded_at: f64,
    pub destination: NodeId,
}

pub(crate) fn transport_transmission(
    g: &mut GraphState,
    params: &PatternParams<'_>,
) -> Result<PatternOutput, ModelError> {
    let mut output = phase_one(g, params.delta1);
    if let Some(delta2) = params.delta2 {
        output.controllers = phase_two(g, delta2);
    }
    Ok(output)
}

/// Snapshot of a transport edge between two layer-4 nodes.
fn trans_edge(g: &GraphState, src: NodeId, dst: NodeId, timestamps: TimestampSet) -> TransEdge {
    let addrs = |id: NodeId| {
        g.node(Layer::Transport, id)
            .map(|n| n.nwk_addrs.clone())
            .unwrap_or_default()
    };
    TransEdge {
        src,
        dst,
        nwk_src: addrs(src),
        nwk_dst: addrs(dst),
        timestamps,
    }
}

fn union_role(scratch: &mut BTreeMap<NodeId, RoleSet>, id: NodeId, role: Role) {
    scratch.entry(id).or_default().union(&RoleSet::of([role]));
}

fn phase_one(g: &mut GraphState, delta: f64) -> PatternOutput {
    // T[src][dst]: sorted distinct timestamps per ordered node pair,
    // grouped from the network links in one round trip.
    let mut traffic: BTreeMap<NodeId, BTreeMap<NodeId, TimestampSet>> = BTreeMap::new();
    for ((src, dst), timestamps) in g.grouped_timestamps(LinkKind::Nwk) {
        traffic.entry(src).or_default().insert(dst, timestamps);
    }

    // Roles accumulate here for the whole pass; store-side roles change
    // only when an edge is first created.
    let mut scratch: BTreeMap<NodeId, RoleSet> =
        traffic.keys().map(|id| (*id, RoleSet::new())).collect();

    let pairs: Vec<(NodeId, NodeId)> = traffic
        .iter()
        .flat_map(|(src, dsts)| dsts.keys().map(move |dst| (*src, *dst)))
        .collect();

    let mut output = PatternOutput::default();

    for (src, dst) in pairs {
        let forward = traffic[&src][&dst].clone();

        if !traffic.contains_key(&dst) {
            // dst never transmits anything: one-way, dst is a pure sink.
            union_role(&mut scratch, src, Role::Source);
            let src_roles = scratch[&src].clone();
            let edge = trans_edge(g, src, dst, forward);
            if g.merge_trans_edge(edge).is_created() {
                output.edges_created += 1;
                if let Some(node) = g.node_mut(Layer::Transport, src) {
                    node.role.union(&src_roles);
                }
                if let Some(node) = g.node_mut(Layer::Transport, dst) {
                    node.role.union(&RoleSet::of([Role::Sink]));
                }
            }
        } else if !traffic[&dst].contains_key(&src) {
            // dst transmits elsewhere but never back to src: still one-way.
            union_role(&mut scratch, src, Role::Source);
            union_role(&mut scratch, dst, Role::Sink);
            let src_roles = scratch[&src].clone();
            let dst_roles = scratch[&dst].clone();
            let edge = trans_edge(g, src, dst, forward);
            if g.merge_trans_edge(edge).is_created() {
                output.edges_created += 1;
                if let Some(node) = g.node_mut(Layer::Transport, src) {
                    node.role.overwrite(src_roles);
                }
                if let Some(node) = g.node_mut(Layer::Transport, dst) {
                    node.role.overwrite(dst_roles);
                }
            }
        } else {
            // Traffic both ways: a reply of dst landing inside the window
            // after a transmission of src is a detected response.
            let replies = traffic[&dst][&src].clone();
            for t2 in replies.iter() {
                for t1 in forward.iter() {
                    if t2 > t1 && t2 - t1 < delta {
                        output.responses.push(ResponseRecord {
                            responder: dst,
                            request_at: t1,
                            requester: src,
                            response_at: t2,
                        });
                        union_role(&mut scratch, dst, Role::Source);
                        union_role(&mut scratch, src, Role::Sink);
                        let responder_roles = scratch[&dst].clone();
                        let requester_roles = scratch[&src].clone();
                        let edge = trans_edge(g, dst, src, replies.clone());
                        if g.merge_trans_edge(edge).is_created() {
                            output.edges_created += 1;
                            if let Some(node) = g.node_mut(Layer::Transport, dst) {
                                node.role.overwrite(responder_roles);
                            }
                            if let Some(node) = g.node_mut(Layer::Transport, src) {
                                node.role.overwrite(requester_roles);
                            }
                        }
                    }
                }
            }
        }
    }

    debug!(
        responses = output.responses.len(),
        edges = output.edges_created,
        "transport phase 1 complete"
    );
    output
}

fn phase_two(g: &mut GraphState, delta: f64) -> Vec<ControllerRecord> {
    let query = ChainQuery {
        layer: Layer::Transport,
        first: RoleFilter::any_of([Role::Source, Role::Controller]),
        middle: RoleFilter::all_of([Role::Source, Role::Sink]),
        last: RoleFilter::any_of([Role::Sink, Role::Controller]),
        hops: HopBound::Two,
        distinct_ends: true,
    };
    // Chains are materialized before any role changes, so the controller
    // overwrite below never hides a chain from this same pass.
    let chains = g.chains(&query);

    let mut records = Vec::new();
    for chain in &chains {
        let (origin, controller, destination) = (chain.nodes[0], chain.nodes[1], chain.nodes[2]);
        let ts1 = &chain.edges[0].timestamps;
        let ts2 = &chain.edges[1].timestamps;
        for t2 in ts2.iter() {
            for t1 in ts1.iter() {
                if t2 > t1 && t2 - t1 < delta {
                    records.push(ControllerRecord {
                        origin,
                        sent_at: t1,
                        controller,
                        forwarded_at: t2,
                        destination,
                    });
                    // Authoritative: supersedes every prior role.
                    if let Some(node) = g.node_mut(Layer::Transport, controller) {
                        node.role.overwrite(RoleSet::of([Role::Controller]));
                    }
                }
            }
        }
    }

    debug!(controllers = records.len(), "transport phase 2 complete");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotmap_core::{AppType, LinkEdge, NodeRecord, Protocol, Transmission};

    fn seeded(ids: &[u32]) -> GraphState {
        let mut g = GraphState::new();
        for &id in ids {
            let addr = format!("0x{id}");
            g.create_node(NodeRecord::new(
                NodeId(id),
                Layer::Datalink,
                [addr.clone()],
                [addr],
            ));
        }
        g.duplicate_layer(Layer::Datalink, Layer::Network);
        g.duplicate_layer(Layer::Datalink, Layer::Transport);
        g
    }

    fn nwk_link(g: &mut GraphState, src: u32, dst: u32, t: f64) {
        g.add_link(LinkEdge {
            kind: LinkKind::Nwk,
            src: NodeId(src),
            dst: NodeId(dst),
            tx: Transmission {
                protocol: Protocol::Zigbee,
                timestamp: t,
                dl_src: format!("0x{src}"),
                dl_dst: format!("0x{dst}"),
                nwk_src: format!("0x{src}"),
                nwk_dst: format!("0x{dst}"),
                app_type: AppType::new(1).unwrap(),
                data: String::new(),
            },
        });
    }

    fn role_at(g: &GraphState, id: u32) -> RoleSet {
        g.node(Layer::Transport, NodeId(id)).unwrap().role.clone()
    }

    #[test]
    fn one_way_classification_is_deterministic() {
        let mut g = seeded(&[1, 2]);
        nwk_link(&mut g, 1, 2, 10.0);
        nwk_link(&mut g, 1, 2, 10.5);
        nwk_link(&mut g, 1, 2, 10.5);

        let output = phase_one(&mut g, 0.6);

        assert_eq!(output.edges_created, 1);
        assert!(output.responses.is_empty());
        let edge = g.trans_edge(NodeId(1), NodeId(2)).unwrap();
        assert_eq!(edge.timestamps.as_slice(), &[10.0, 10.5]);
        assert!(role_at(&g, 1).contains(Role::Source));
        assert_eq!(role_at(&g, 2), RoleSet::of([Role::Sink]));
    }

    #[test]
    fn response_window_is_strict() {
        // Replies exactly at the window never qualify; just inside does.
        // 0.5, 10.25 and 10.5 are exactly representable, keeping the
        // boundary comparison free of rounding.
        let delta = 0.5;
        for (reply_at, expected) in [(10.25, true), (10.5, false), (10.0, false)] {
            let mut g = seeded(&[1, 2]);
            nwk_link(&mut g, 1, 2, 10.0);
            nwk_link(&mut g, 2, 1, reply_at);

            let output = phase_one(&mut g, delta);

            if expected {
                assert_eq!(output.responses.len(), 1);
                let record = &output.responses[0];
                assert_eq!(record.responder, NodeId(2));
                assert_eq!(record.request_at, 10.0);
                assert_eq!(record.response_at, reply_at);
                // The responder becomes the edge source.
                let edge = g.trans_edge(NodeId(2), NodeId(1)).unwrap();
                assert_eq!(edge.timestamps.as_slice(), &[reply_at]);
                assert!(role_at(&g, 2).contains(Role::Source));
                assert!(role_at(&g, 1).contains(Role::Sink));
            } else {
                assert!(output.responses.is_empty(), "reply_at = {reply_at}");
                assert_eq!(g.trans_edges().count(), 0);
            }
        }
    }

    #[test]
    fn every_qualifying_pair_is_recorded_edge_created_once() {
        let mut g = seeded(&[1, 2]);
        nwk_link(&mut g, 1, 2, 10.0);
        nwk_link(&mut g, 1, 2, 10.2);
        nwk_link(&mut g, 2, 1, 10.3);

        let output = phase_one(&mut g, 0.6);

        // 10.3 answers both 10.0 and 10.2.
        assert_eq!(output.responses.len(), 2);
        assert_eq!(g.trans_edges().count(), 1);
        let edge = g.trans_edge(NodeId(2), NodeId(1)).unwrap();
        assert_eq!(edge.timestamps.as_slice(), &[10.3]);
    }

    #[test]
    fn roles_only_grow_during_phase_one() {
        // 1 -> 2 one-way, 2 -> 3 one-way: node 2 ends up source and sink.
        let mut g = seeded(&[1, 2, 3]);
        nwk_link(&mut g, 1, 2, 1.0);
        nwk_link(&mut g, 2, 3, 5.0);

        phase_one(&mut g, 0.6);

        assert_eq!(role_at(&g, 1), RoleSet::of([Role::Source]));
        assert_eq!(role_at(&g, 2), RoleSet::of([Role::Source, Role::Sink]));
        assert_eq!(role_at(&g, 3), RoleSet::of([Role::Sink]));
    }

    fn controller_scenario() -> GraphState {
        let mut g = seeded(&[1, 2, 3]);
        g.node_mut(Layer::Transport, NodeId(1))
            .unwrap()
            .role
            .overwrite(RoleSet::of([Role::Source]));
        g.node_mut(Layer::Transport, NodeId(2))
            .unwrap()
            .role
            .overwrite(RoleSet::of([Role::Source, Role::Sink]));
        g.node_mut(Layer::Transport, NodeId(3))
            .unwrap()
            .role
            .overwrite(RoleSet::of([Role::Sink]));
        let e1 = trans_edge(&g, NodeId(1), NodeId(2), [1.0].into_iter().collect());
        let e2 = trans_edge(&g, NodeId(2), NodeId(3), [1.3].into_iter().collect());
        g.merge_trans_edge(e1);
        g.merge_trans_edge(e2);
        g
    }

    #[test]
    fn controller_detected_inside_window() {
        let mut g = controller_scenario();
        let records = phase_two(&mut g, 0.5);

        assert_eq!(
            records,
            vec![ControllerRecord {
                origin: NodeId(1),
                sent_at: 1.0,
                controller: NodeId(2),
                forwarded_at: 1.3,
                destination: NodeId(3),
            }]
        );
        // The overwrite supersedes source+sink entirely.
        assert_eq!(role_at(&g, 2), RoleSet::of([Role::Controller]));
    }

    #[test]
    fn controller_window_too_small_changes_nothing() {
        let mut g = controller_scenario();
        let records = phase_two(&mut g, 0.1);

        assert!(records.is_empty());
        assert_eq!(role_at(&g, 2), RoleSet::of([Role::Source, Role::Sink]));
    }

    #[test]
    fn phase_two_skipped_when_delta_absent() {
        let mut g = seeded(&[1, 2]);
        nwk_link(&mut g, 1, 2, 1.0);

        let params = PatternParams {
            transmissions: &[],
            delta1: 0.6,
            delta2: None,
            adelta: 1.5,
        };
        let output = transport_transmission(&mut g, &params).unwrap();

        assert!(output.controllers.is_empty());
        assert_eq!(output.edges_created, 1);
    }
}
