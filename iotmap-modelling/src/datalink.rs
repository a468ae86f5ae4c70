//! Datalink layer builder: point-to-point edges from the raw feed.
//!
//! One `dlLink` edge per transmission, no merging. Endpoints resolve by
//! datalink-address containment against the layer-2 node population; a
//! transmission matching no node is dropped and logged, never fatal.

use crate::error::ModelError;
use crate::patterns::{PatternOutput, PatternParams};
use iotmap_core::{Layer, LinkEdge, LinkKind, NodeId};
use iotmap_store::GraphState;
use tracing::warn;

pub(crate) fn node_transmission(
    g: &mut GraphState,
    params: &PatternParams<'_>,
) -> Result<PatternOutput, ModelError> {
    let mut output = PatternOutput::default();

    for tx in params.transmissions {
        let src = g.find_by_dl(Layer::Datalink, &tx.dl_src).map(|n| n.id);
        let dst = g.find_by_dl(Layer::Datalink, &tx.dl_dst).map(|n| n.id);
        let (Some(src), Some(dst)) = (src, dst) else {
            warn!(
                dl_src = %tx.dl_src,
                dl_dst = %tx.dl_dst,
                timestamp = tx.timestamp,
                "transmission endpoints match no known node, dropping"
            );
            output.dropped += 1;
            continue;
        };
        g.add_link(LinkEdge {
            kind: LinkKind::Dl,
            src,
            dst,
            tx: tx.clone(),
        });
        output.edges_created += 1;
    }

    // Cosmetic collapse: one presentational edge per pair.
    let pairs: Vec<(NodeId, NodeId)> = g.links(LinkKind::Dl).map(|l| (l.src, l.dst)).collect();
    for (src, dst) in pairs {
        g.merge_visual(Layer::Datalink, src, dst);
    }

    Ok(output)
}
