//! Application layer builder: causal-chain detection.
//!
//! Enumerates simple transport paths from a source, through at least one
//! controller, to a sink, and requires every consecutive edge pair to
//! carry a witness: two timestamps within `adelta` of each other in
//! causal order. A path whose chain holds end to end yields one
//! interaction edge from its first node to its last.

use crate::error::ModelError;
use crate::patterns::{PatternOutput, PatternParams};
use iotmap_core::{InteractEdge, Layer, NodeId, Role, TimestampSet};
use iotmap_store::{ChainQuery, GraphState, HopBound, RoleFilter};
use tracing::debug;

fn has_witness(earlier: &TimestampSet, later: &TimestampSet, delta: f64) -> bool {
    later
        .iter()
        .any(|t2| earlier.iter().any(|t1| t2 > t1 && t2 - t1 < delta))
}

pub(crate) fn interact(
    g: &mut GraphState,
    params: &PatternParams<'_>,
) -> Result<PatternOutput, ModelError> {
    let delta = params.adelta;
    let query = ChainQuery {
        layer: Layer::Transport,
        first: RoleFilter::any_of([Role::Source]),
        middle: RoleFilter::any_of([Role::Controller]),
        last: RoleFilter::any_of([Role::Sink]),
        hops: HopBound::AtLeastTwo,
        distinct_ends: true,
    };
    let paths = g.chains(&query);

    let mut output = PatternOutput::default();
    for path in &paths {
        let causal = (1..path.edges.len()).all(|i| {
            has_witness(
                &path.edges[i - 1].timestamps,
                &path.edges[i].timestamps,
                delta,
            )
        });
        if !causal {
            continue;
        }

        let (first, last) = (path.first(), path.last());
        let addrs = |id: NodeId| {
            g.node(Layer::Application, id)
                .map(|n| n.nwk_addrs.clone())
                .unwrap_or_default()
        };
        let edge = InteractEdge {
            src: first,
            dst: last,
            nwk_src: addrs(first),
            nwk_dst: addrs(last),
        };
        if g.merge_interact_edge(edge).is_created() {
            output.edges_created += 1;
            output.interactions += 1;
        }
    }

    debug!(
        candidates = paths.len(),
        interactions = output.interactions,
        "application pass complete"
    );
    Ok(output)
}
